//! Layouts shipped with the binary, one per dashboard module.

use crate::error::ConfigError;
use crate::layout::ModuleLayout;

const AUDIT: &str = include_str!("../layouts/audit.toml");
const PAYMENTS: &str = include_str!("../layouts/payments.toml");
const FINANCES: &str = include_str!("../layouts/finances.toml");
const MESSAGES: &str = include_str!("../layouts/messages.toml");
const EQUIPMENT: &str = include_str!("../layouts/equipment.toml");

const BUILTIN: &[(&str, &str)] = &[
    ("audit", AUDIT),
    ("payments", PAYMENTS),
    ("finances", FINANCES),
    ("messages", MESSAGES),
    ("equipment", EQUIPMENT),
];

/// Module ids with a built-in layout, in display order.
pub fn builtin_modules() -> impl Iterator<Item = &'static str> {
    BUILTIN.iter().map(|(id, _)| *id)
}

/// Parse the built-in layout for `module`.
pub fn builtin(module: &str) -> Result<ModuleLayout, ConfigError> {
    let (_, text) = BUILTIN
        .iter()
        .find(|(id, _)| *id == module)
        .ok_or_else(|| ConfigError::UnknownModule(module.to_string()))?;
    ModuleLayout::from_toml(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_layout_is_valid() {
        for module in builtin_modules() {
            let layout = builtin(module).unwrap_or_else(|e| panic!("{module}: {e}"));
            assert_eq!(layout.module, module);
            assert!(!layout.categories.is_empty());
        }
    }

    #[test]
    fn audit_starts_on_pending() {
        let layout = builtin("audit").unwrap();
        assert_eq!(layout.first_category().unwrap().id, "pending");
        assert!(layout.category("urgent").is_some());
    }

    #[test]
    fn unknown_module() {
        assert_eq!(
            builtin("hr").unwrap_err(),
            ConfigError::UnknownModule("hr".into())
        );
    }
}
