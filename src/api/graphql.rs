use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::Extension,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::app_state::AppState;
use crate::graphql::graph_schema::AppSchema;
use crate::middleware::auth::Caller;

pub fn graphql_routes(schema: AppSchema) -> Router<AppState> {
    Router::new()
        .route("/graphql", get(graphql_playground).post(graphql_handler))
        .layer(Extension(schema))
}

pub async fn graphql_handler(
    Extension(schema): Extension<AppSchema>,
    Extension(caller): Extension<Caller>, // 👈 from jwt_middleware
    req: GraphQLRequest,
) -> GraphQLResponse {
    let gql_request = req.into_inner().data(caller); // ✅ inject the caller
    schema.execute(gql_request).await.into()
}

async fn graphql_playground() -> impl IntoResponse {
    Html(playground_source(GraphQLPlaygroundConfig::new("/graphql")))
}
