//! Request and response types for the tutoring storefront API.
//!
//! This crate encodes the HTTP contract as Rust types, together with the
//! boundary validation applied before anything reaches the document store.
//!
//! # Endpoints covered
//!
//! | Method | Path | Type |
//! |--------|------|------|
//! | GET | `/collections/lesson` | → `Vec<`[`Document`]`>` |
//! | POST | `/orders` | [`OrderRequest`] → [`OrderCreated`] |
//! | PUT | `/courses/{course_id}` | [`AvailabilityRequest`] → [`MessageResponse`] |
//! | GET | `/collections/{collection_name}` | → `Vec<`[`Document`]`>` |
//! | GET | `/collections/{collection_name}/{id}` | → [`Document`] |
//! | PUT | `/collections/{collection_name}/{id}` | [`FieldUpdate`] → [`MessageResponse`] |
//! | DELETE | `/collections/{collection_name}/{id}` | → [`MessageResponse`] |
//!
//! Every failure is an [`ErrorResponse`].

pub mod course;
pub mod document;
pub mod error;
pub mod order;

pub use course::AvailabilityRequest;
pub use document::{remaining_of, Document, FieldUpdate, ID_FIELD, REMAINING_FIELD};
pub use error::{ErrorResponse, MessageResponse, ValidationError};
pub use order::{OrderCreated, OrderRequest};
