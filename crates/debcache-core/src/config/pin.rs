use serde::{Deserialize, Serialize};

use crate::cache::PackageFile;

/// Selects package files by their release metadata.
///
/// Every field that is set must match; unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
}

impl ReleaseSelector {
    pub fn archive(archive: impl Into<String>) -> Self {
        Self { archive: Some(archive.into()), ..Self::default() }
    }

    pub fn matches(&self, file: &PackageFile) -> bool {
        fn field(want: &Option<String>, have: &Option<String>) -> bool {
            match want {
                None => true,
                Some(want) => have.as_deref() == Some(want.as_str()),
            }
        }

        field(&self.archive, &file.archive)
            && field(&self.codename, &file.codename)
            && field(&self.origin, &file.origin)
            && field(&self.label, &file.label)
            && field(&self.component, &file.component)
    }
}

/// A preferences entry: `package` and `version` are glob patterns.
///
/// A pin whose package is `*` applies to whole package files and needs a
/// release selector; any other pin applies to the matching versions only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Pin {
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<ReleaseSelector>,
    pub priority: i32,
}

impl Pin {
    pub fn new(package: impl Into<String>, priority: i32) -> Self {
        Self { package: package.into(), version: None, release: None, priority }
    }

    pub fn version(mut self, pattern: impl Into<String>) -> Self {
        self.version = Some(pattern.into());
        self
    }

    pub fn release(mut self, selector: ReleaseSelector) -> Self {
        self.release = Some(selector);
        self
    }

    pub fn is_generic(&self) -> bool {
        self.package == "*"
    }
}
