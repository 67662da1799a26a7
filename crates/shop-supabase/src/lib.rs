//! # shop-supabase
//!
//! Supabase integration for shopaholic:
//!
//! - **PostgrestCartStore** - `shopping_lists` rows over the PostgREST API
//! - **SupabaseAuth** - access token resolution and sign-out via Supabase Auth
//!
//! ```rust,ignore
//! use shop_supabase::{PostgrestCartStore, SupabaseAuth, SupabaseConfig};
//!
//! let config = SupabaseConfig::from_env()?;
//! let store = PostgrestCartStore::new(config.clone())?;
//! let auth = SupabaseAuth::new(config)?;
//! ```

pub mod auth;
pub mod config;
pub mod store;

pub use auth::SupabaseAuth;
pub use config::{SupabaseConfig, SHOPPING_LISTS_TABLE};
pub use store::PostgrestCartStore;
