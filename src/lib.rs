//! Course and trainer catalog for the training platform site.
//!
//! Reads go to the hosted data service first and fall back to a compiled-in
//! dataset; results are normalized into flat entities and can be narrowed with
//! the facet filters in [`filter`].

pub mod catalog;
pub mod config;
pub mod enquiry;
pub mod fallback;
pub mod filter;
pub mod models;
pub mod price;
pub mod routes;
pub mod rows;
pub mod service;
