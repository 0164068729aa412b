//! Unit tests for JWT claims.

#[cfg(test)]
mod tests {
    use crate::auth::{Claims, TokenKind};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    #[test]
    fn test_claims_new_sets_correct_fields() {
        let user_id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::hours(1);

        let claims = Claims::new(user_id, "Comptable", TokenKind::Access, expires_at);

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, "Comptable");
        assert_eq!(claims.typ, TokenKind::Access);
        assert!(claims.iat <= Utc::now().timestamp());
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn test_claims_with_each_role() {
        let user_id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::hours(1);

        for role in ["Comptable", "Directeur", "CSA"] {
            let claims = Claims::new(user_id, role, TokenKind::Refresh, expires_at);
            assert_eq!(claims.role, role);
            assert!(!claims.is_access());
        }
    }

    #[test]
    fn test_token_kind_serializes_lowercase() {
        let json = serde_json::to_string(&TokenKind::Refresh).unwrap();
        assert_eq!(json, "\"refresh\"");
    }

    #[test]
    fn test_claims_iat_is_current_time() {
        let before = Utc::now().timestamp();
        let claims = Claims::new(
            Uuid::new_v4(),
            "CSA",
            TokenKind::Access,
            Utc::now() + Duration::hours(1),
        );
        let after = Utc::now().timestamp();
        assert!(claims.iat >= before);
        assert!(claims.iat <= after);
    }
}
