// flowdeck/src/registry/mod.rs

//! Typed registries. [`Registry`] is the generic keyed store; the specialised
//! registries wrap it and only add query or merge helpers on top.

pub mod category;
pub mod context_menu;
pub mod edge;
pub mod item;
pub mod node;
pub mod rule;
pub mod store;
pub mod theme;

pub use category::{CategoryConfig, CategoryRegistry};
pub use context_menu::{ContextMenuConfig, ContextMenuItem, ContextMenuRegistry, MenuTarget};
pub use edge::{EdgeConfig, EdgeOverrides, EdgeRegistry};
pub use item::{RegistryItem, RegistryItemPatch};
pub use node::{NodeOverrides, NodeRegistry};
pub use rule::{ConnectionVerdict, RuleConfig, RuleEffect, RuleRegistry};
pub use store::Registry;
pub use theme::{ThemeConfig, ThemeRegistry};
