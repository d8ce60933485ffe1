//! Command handlers organized by operation category.
//!
//! | Module | Commands | Facade |
//! |--------|----------|--------|
//! | `table` | 4 | TableStore |
//! | `document` | 7 | DocumentStore |

pub mod document;
pub mod table;
