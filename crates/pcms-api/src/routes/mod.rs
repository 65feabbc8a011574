//! # API Route Modules
//!
//! | Prefix                | Module         |
//! |-----------------------|----------------|
//! | `/v1/components/*`    | [`components`] |
//! | `/v1/orgs/*`, `/v1/sections/*` | [`sections`] |
//! | `/v1/preview/*`       | [`preview`]    |

pub mod components;
pub mod preview;
pub mod sections;
