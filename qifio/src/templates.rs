//! Поиск шаблона: встроенный по имени или YAML-файл по пути.

use anyhow::{Context, Result};
use qifiolib::{model::AccountKind, template::MappingTemplate};
use std::fs;
use std::path::Path;

pub fn load_yaml(path: &Path) -> Result<MappingTemplate> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read template {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("invalid template {}", path.display()))
}

/// `--template` и `--type` в готовый шаблон. Явный тип перекрывает тип
/// из шаблона; без имени шаблона встроенный выбирается по явному типу,
/// а если его нет, по типу, найденному во входе.
pub fn resolve(
    name_or_path: Option<&str>,
    kind: Option<AccountKind>,
    detected: Option<AccountKind>,
) -> Result<MappingTemplate> {
    let mut template = match name_or_path {
        Some(name) => match MappingTemplate::builtin(name) {
            Some(t) => t,
            None => {
                let path = Path::new(name);
                if !path.exists() {
                    anyhow::bail!(
                        "unknown template '{name}': not a file and not one of {}",
                        MappingTemplate::BUILTIN_NAMES.join(", ")
                    );
                }
                load_yaml(path)?
            }
        },
        None => MappingTemplate::for_kind(kind.or(detected).unwrap_or(AccountKind::Bank)),
    };
    if let Some(kind) = kind {
        template.account_kind = kind;
    }
    log::debug!("using template '{}' ({:?})", template.name, template.account_kind);
    Ok(template)
}
