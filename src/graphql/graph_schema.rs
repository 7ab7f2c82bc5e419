use std::sync::Arc;

use async_graphql::{EmptyMutation, EmptySubscription, Schema};

use crate::auth::AccessPolicy;
use crate::db::queries::person::PersonStore;
use crate::graphql::graph::QueryRoot;

pub type AppSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

pub fn create_schema(store: Arc<dyn PersonStore>, policy: AccessPolicy) -> AppSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(store) // ✅ Person store for the `persons` resolver
        .data(policy) // ✅ Role rules checked by `RoleGuard`
        .limit_depth(10)
        .finish()
}
