pub mod dom_query;

pub use dom_query::DomQuery;
