//! Target path templates.

use crate::types::{value_to_string, VarMap};

/// Resolves a target template against a crawler's variables.
///
/// Implementations must be deterministic for identical templates and variables.
pub trait TemplateResolver: Send + Sync {
    fn resolve(&self, template: &str, vars: &VarMap) -> anyhow::Result<String>;
}

/// `{varName}` substitution.
///
/// String values are inserted verbatim, any other value as its JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct VarTemplate;

impl TemplateResolver for VarTemplate {
    fn resolve(&self, template: &str, vars: &VarMap) -> anyhow::Result<String> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find(|c: char| c == '{' || c == '}') {
            if rest[open..].starts_with('}') {
                anyhow::bail!("unbalanced '}}' at offset {}", template.len() - rest.len() + open);
            }
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| anyhow::anyhow!("unterminated '{{' in template"))?;
            let name = after[..close].trim();
            if name.is_empty() || name.contains('{') {
                anyhow::bail!("invalid variable reference \"{}\"", &after[..close]);
            }
            let value = vars
                .get(name)
                .ok_or_else(|| anyhow::anyhow!("unknown variable \"{}\"", name))?;
            out.push_str(&value_to_string(value));
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}
