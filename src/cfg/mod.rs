//! cfg 模块 - 配置管理
//!
//! 提供基于 `TypeOptions` 的类型注册表，按名称从配置创建 trait object

pub mod macros;
pub mod registry;
pub mod type_options;

pub use registry::{create_trait_from_type_options, register_trait};
pub use type_options::TypeOptions;
