//! Ownership checks shared by the pipeline stages

use crate::error::{AuthorizationError, StoreError, VerificationError};
use crate::store::OwnerAdmin;
use fabric_spec::{EntityId, KerberosPrincipalId};

/// Identity existing state is read as during a deployment
///
/// The requested owner when one is given, otherwise the namespace's
/// impersonation principal, otherwise the requesting user.
///
/// # Errors
/// Returns [`StoreError`] if the impersonation lookup fails
pub async fn authorizing_user(
    owner_admin: &dyn OwnerAdmin,
    namespace: &str,
    owner: Option<&KerberosPrincipalId>,
    requester: &str,
) -> Result<String, StoreError> {
    if let Some(owner) = owner {
        return Ok(owner.principal().to_string());
    }
    match owner_admin.impersonation_principal(namespace).await? {
        Some(principal) => Ok(principal.principal().to_string()),
        None => Ok(requester.to_string()),
    }
}

/// Check the requested owner against the owner of record for `entity`
///
/// Absent on both sides counts as a match.
///
/// # Errors
/// Returns [`VerificationError::Unauthorized`] when the owners differ and
/// [`VerificationError::Backend`] if the owner lookup fails
pub async fn verify_owner(
    owner_admin: &dyn OwnerAdmin,
    entity: &EntityId,
    requested: Option<&KerberosPrincipalId>,
) -> Result<(), VerificationError> {
    let existing = owner_admin.owner(entity).await?;
    if existing.as_ref() == requested {
        return Ok(());
    }

    tracing::debug!(%entity, ?existing, ?requested, "owner principal mismatch");
    Err(AuthorizationError {
        entity: entity.clone(),
        existing: existing.map(|p| p.principal().to_string()),
        requested: requested.map(|p| p.principal().to_string()),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryOwnerAdmin;
    use fabric_spec::DatasetId;

    #[tokio::test]
    async fn authorizing_user_precedence() {
        let admin = MemoryOwnerAdmin::new().with_impersonation("ns", KerberosPrincipalId::new("svc@R"));
        let owner = KerberosPrincipalId::new("alice@R");

        assert_eq!(
            authorizing_user(&admin, "ns", Some(&owner), "bob").await.unwrap(),
            "alice@R"
        );
        assert_eq!(authorizing_user(&admin, "ns", None, "bob").await.unwrap(), "svc@R");
        assert_eq!(authorizing_user(&admin, "other", None, "bob").await.unwrap(), "bob");
    }

    #[tokio::test]
    async fn owner_comparison() {
        let admin = MemoryOwnerAdmin::new();
        let entity = EntityId::Dataset(DatasetId::new("ns", "d"));
        let alice = KerberosPrincipalId::new("alice@R");

        assert!(verify_owner(&admin, &entity, None).await.is_ok());
        assert!(verify_owner(&admin, &entity, Some(&alice))
            .await
            .unwrap_err()
            .is_unauthorized());

        admin.set_owner(entity.clone(), alice.clone()).await.unwrap();
        assert!(verify_owner(&admin, &entity, Some(&alice)).await.is_ok());
        match verify_owner(&admin, &entity, None).await {
            Err(VerificationError::Unauthorized(err)) => {
                assert_eq!(err.existing.as_deref(), Some("alice@R"));
            }
            other => panic!("expected unauthorized, got {other:?}"),
        }
    }
}
