use crate::cfg::{create_trait_from_type_options, register_trait, TypeOptions};
use crate::log::sink::{
    console_sink::{ConsoleProvider, ConsoleProviderConfig},
    memory_sink::{MemoryProvider, MemoryProviderConfig},
    noop_sink::{NoopProvider, NoopProviderConfig},
    LoggerProvider,
};
use anyhow::Result;
use std::sync::Arc;

/// 注册所有内置 Provider 实现
pub fn register_providers() -> Result<()> {
    register_trait::<ConsoleProvider, dyn LoggerProvider, ConsoleProviderConfig>(
        "ConsoleProvider",
    )?;
    register_trait::<MemoryProvider, dyn LoggerProvider, MemoryProviderConfig>("MemoryProvider")?;
    register_trait::<NoopProvider, dyn LoggerProvider, NoopProviderConfig>("NoopProvider")?;
    Ok(())
}

/// 从 TypeOptions 创建 Provider
pub fn create_provider_from_options(options: &TypeOptions) -> Result<Arc<dyn LoggerProvider>> {
    let provider: Box<dyn LoggerProvider> = create_trait_from_type_options(options)?;
    Ok(Arc::from(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_builtin_providers() -> Result<()> {
        register_providers()?;

        let console = create_provider_from_options(&TypeOptions::from_json(
            r#"{ type: "ConsoleProvider", options: { name: "terminal", colored: true } }"#,
        )?)?;
        assert_eq!(console.name(), "terminal");

        let memory = create_provider_from_options(&TypeOptions::new("MemoryProvider"))?;
        assert_eq!(memory.name(), "memory");

        let noop = create_provider_from_options(&TypeOptions::new("NoopProvider"))?;
        assert_eq!(noop.name(), "noop");
        assert!(noop.create_logger("app").flush().is_ok());

        Ok(())
    }

    #[test]
    fn test_unknown_provider_type() -> Result<()> {
        register_providers()?;
        assert!(create_provider_from_options(&TypeOptions::new("GtagProvider")).is_err());
        Ok(())
    }
}
