//! # Repository Module
//!
//! Database repository implementations for the catalog service.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler / OfferReconciler / ProductRegistrar                     │
//! │       │                                                                 │
//! │       │  db.offers().in_stock_for_product(id)                          │
//! │       ▼                                                                 │
//! │  ProductRepository              OfferRepository                        │
//! │  ├── get_by_id(id)              ├── insert_if_absent(offer)            │
//! │  ├── insert(product)            ├── in_stock_for_product(id)           │
//! │  ├── update(id, changes)        ├── get_by_id(id)                      │
//! │  ├── delete(id)                 └── count_for_product(id)              │
//! │  └── count()                                                           │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD
//! - [`offer::OfferRepository`] - Offer upserts and in-stock queries

pub mod offer;
pub mod product;
