use std::sync::Arc;

use async_graphql::{Context, ErrorExtensions, Guard, Object, Result, SimpleObject};
use tracing::error;

use crate::auth::AccessPolicy;
use crate::db::models::person::Person;
use crate::db::queries::person::{PersonStore, StoreError};
use crate::middleware::auth::Caller;

#[derive(SimpleObject, Clone, Debug, PartialEq)]
#[graphql(name = "Person")]
pub struct PersonGQL {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub e_mail: Option<String>,
}

impl From<Person> for PersonGQL {
    fn from(person: Person) -> Self {
        Self {
            id: person.id,
            first_name: person.first_name,
            last_name: person.last_name,
            e_mail: person.e_mail,
        }
    }
}

impl ErrorExtensions for StoreError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| {
            e.set("classification", "INTERNAL_ERROR");
            e.set("code", "INTERNAL_ERROR");
        })
    }
}

/// Runs the [`AccessPolicy`] rule for one query before its resolver executes.
pub struct RoleGuard {
    operation: &'static str,
}

impl RoleGuard {
    pub fn new(operation: &'static str) -> Self {
        Self { operation }
    }
}

impl Guard for RoleGuard {
    async fn check(&self, ctx: &Context<'_>) -> Result<()> {
        let policy = ctx.data::<AccessPolicy>()?;
        let roles = ctx
            .data_opt::<Caller>()
            .and_then(Caller::principal)
            .map(|principal| &principal.roles);

        policy
            .authorize(self.operation, roles)
            .map_err(|e| e.extend())
    }
}

#[derive(Default)]
pub struct QueryRoot;

#[Object(name = "Query")]
impl QueryRoot {
    /// Liveness probe, open to everyone.
    async fn ping(&self) -> &'static str {
        "pong"
    }

    /// `preferred_username` of the caller; null when anonymous or when the claim is absent.
    async fn me(&self, ctx: &Context<'_>) -> Option<String> {
        ctx.data_opt::<Caller>()
            .and_then(Caller::principal)
            .and_then(|principal| principal.username())
    }

    /// Every stored person. Requires the role configured for `persons` (ADMIN by default).
    #[graphql(guard = "RoleGuard::new(\"persons\")")]
    async fn persons(&self, ctx: &Context<'_>) -> Result<Option<Vec<PersonGQL>>> {
        let store = ctx.data::<Arc<dyn PersonStore>>()?;

        let persons = store.find_all().await.map_err(|e| {
            error!("Failed to load persons: {}", e);
            e.extend()
        })?;

        Ok(Some(persons.into_iter().map(PersonGQL::from).collect()))
    }
}
