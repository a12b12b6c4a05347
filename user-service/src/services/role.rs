use std::sync::Arc;

use crate::{
    dtos::role::{CreateRoleRequest, PatchRoleRequest, UpdateRoleRequest},
    models::{Role, RoleFields},
    services::{ServiceError, Store},
};

const ROLE_NOT_FOUND: &str = "Role not found";

#[derive(Clone)]
pub struct RoleService {
    store: Arc<dyn Store>,
}

impl RoleService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, req: CreateRoleRequest) -> Result<Role, ServiceError> {
        let role = self
            .store
            .insert_role(&RoleFields {
                role_name: req.role_name,
                role_description: req.role_description,
            })
            .await?;

        tracing::info!(role_id = role.id, role_name = %role.role_name, "Role created");
        Ok(role)
    }

    pub async fn get(&self, id: i32) -> Result<Role, ServiceError> {
        self.store
            .find_role(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ROLE_NOT_FOUND))
    }

    pub async fn list(&self) -> Result<Vec<Role>, ServiceError> {
        Ok(self.store.list_roles().await?)
    }

    pub async fn update(&self, id: i32, req: UpdateRoleRequest) -> Result<Role, ServiceError> {
        self.store
            .update_role(
                id,
                &RoleFields {
                    role_name: req.role_name,
                    role_description: req.role_description,
                },
            )
            .await?
            .ok_or_else(|| ServiceError::not_found(ROLE_NOT_FOUND))
    }

    pub async fn patch(&self, id: i32, req: PatchRoleRequest) -> Result<Role, ServiceError> {
        let existing = self.get(id).await?;

        let fields = RoleFields {
            role_name: req.role_name.unwrap_or(existing.role_name),
            role_description: req.role_description.unwrap_or(existing.role_description),
        };

        self.store
            .update_role(id, &fields)
            .await?
            .ok_or_else(|| ServiceError::not_found(ROLE_NOT_FOUND))
    }

    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        if !self.store.delete_role(id).await? {
            return Err(ServiceError::not_found(ROLE_NOT_FOUND));
        }

        tracing::info!(role_id = id, "Role deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoleName;
    use crate::services::MockStore;

    fn service() -> RoleService {
        RoleService::new(Arc::new(MockStore::with_seeded_roles()))
    }

    #[tokio::test]
    async fn duplicate_role_name_is_a_conflict() {
        let err = service()
            .create(CreateRoleRequest {
                role_name: RoleName::Admin,
                role_description: "Second admin".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(msg) if msg.starts_with("Unique key constraint fails with")));
    }

    #[tokio::test]
    async fn patch_keeps_unspecified_fields() {
        let roles = service();
        let patched = roles
            .patch(
                3,
                PatchRoleRequest {
                    role_name: None,
                    role_description: Some("Team leads".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(patched.role_name, RoleName::Manager);
        assert_eq!(patched.role_description, "Team leads");
    }

    #[tokio::test]
    async fn missing_role_is_not_found() {
        let roles = service();
        assert!(matches!(roles.get(99).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(roles.delete(99).await, Err(ServiceError::NotFound(_))));
    }
}
