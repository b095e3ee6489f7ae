//! SeaORM implementation of ProjectRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::domain::{CreateProjectInput, DomainError, Project, ProjectRepository};
use crate::models::project::{ActiveModel, Entity as ProjectEntity, Model};
use crate::models::project_commande;

const DEFAULT_STATUS: &str = "Planifié";

/// SeaORM-based implementation of ProjectRepository
pub struct SeaOrmProjectRepository {
    db: DatabaseConnection,
}

impl SeaOrmProjectRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_project(p: Model) -> Project {
    Project {
        id: p.id,
        name: p.name,
        description: p.description,
        budget: p.budget,
        status: p.status,
        chef_projet_id: p.chef_projet_id,
        created_at: p.created_at,
        updated_at: p.updated_at,
    }
}

#[async_trait]
impl ProjectRepository for SeaOrmProjectRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Project>, DomainError> {
        let project = ProjectEntity::find_by_id(id).one(&self.db).await?;
        Ok(project.map(to_project))
    }

    async fn create(
        &self,
        chef_projet_id: i32,
        input: CreateProjectInput,
    ) -> Result<Project, DomainError> {
        let now = chrono::Utc::now().to_rfc3339();

        let project = ActiveModel {
            name: Set(input.name.trim().to_owned()),
            description: Set(input.description),
            budget: Set(input.budget),
            status: Set(input.status.unwrap_or_else(|| DEFAULT_STATUS.to_owned())),
            chef_projet_id: Set(chef_projet_id),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = project.insert(&self.db).await?;
        Ok(to_project(result))
    }

    async fn commande_ids(&self, project_id: i32) -> Result<Vec<i32>, DomainError> {
        let ids = project_commande::Entity::find()
            .select_only()
            .column(project_commande::Column::CommandeId)
            .filter(project_commande::Column::ProjectId.eq(project_id))
            .order_by_asc(project_commande::Column::CommandeId)
            .into_tuple::<i32>()
            .all(&self.db)
            .await?;
        Ok(ids)
    }
}
