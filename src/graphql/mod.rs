pub mod graph;
pub mod graph_schema;
