// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod columns;
pub mod dates;
pub mod filters;
pub mod ids;
pub mod model;
pub mod query;
pub mod search;
pub mod state;

pub use columns::*;
pub use dates::*;
pub use filters::*;
pub use ids::*;
pub use model::*;
pub use query::*;
pub use search::*;
pub use state::*;
