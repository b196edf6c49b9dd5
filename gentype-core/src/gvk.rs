//! Type information identifying what a client talks to.
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to parse group version: {0}")]
/// Failed to parse group version.
pub struct ParseGroupVersionError(pub String);

/// A kind within an API group version.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GroupVersionKind {
    /// API group
    pub group: String,
    /// Version
    pub version: String,
    /// Kind
    pub kind: String,
}

impl GroupVersionKind {
    /// Construct from explicit group, version, and kind
    pub fn gvk(group: &str, version: &str, kind: &str) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Generate the apiVersion string used in a kind's yaml
    pub fn api_version(&self) -> String {
        GroupVersion::gv(&self.group, &self.version).api_version()
    }
}

/// An API group at a version.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GroupVersion {
    /// API group, empty for the legacy core group
    pub group: String,
    /// Version
    pub version: String,
}

impl GroupVersion {
    /// Construct from explicit group and version
    pub fn gv(group: &str, version: &str) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
        }
    }

    /// Generate the apiVersion string used in a kind's yaml
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// The url prefix serving this group version
    ///
    /// The legacy core group lives under `/api`, every named group under `/apis`.
    pub fn api_path(&self) -> String {
        if self.group.is_empty() {
            format!("/api/{}", self.version)
        } else {
            format!("/apis/{}/{}", self.group, self.version)
        }
    }
}

impl FromStr for GroupVersion {
    type Err = ParseGroupVersionError;

    fn from_str(gv: &str) -> Result<Self, Self::Err> {
        let gvsplit = gv.splitn(2, '/').collect::<Vec<_>>();
        let (group, version) = match *gvsplit.as_slice() {
            [g, v] if !g.is_empty() && !v.is_empty() => (g, v),
            [v] if !v.is_empty() => ("", v),
            _ => return Err(ParseGroupVersionError(gv.into())),
        };
        Ok(Self::gv(group, version))
    }
}

/// A resource within an API group version.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GroupVersionResource {
    /// API group
    pub group: String,
    /// Version
    pub version: String,
    /// Resource, the plural lowercase name used in urls
    pub resource: String,
}

impl GroupVersionResource {
    /// Set the api group, version, and the plural resource name.
    pub fn gvr(group: &str, version: &str, resource: &str) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
        }
    }

    /// The group version this resource is served under
    pub fn group_version(&self) -> GroupVersion {
        GroupVersion::gv(&self.group, &self.version)
    }
}

impl fmt::Display for GroupVersionResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.version, self.resource)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.resource)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_version_paths() {
        let core: GroupVersion = "v1".parse().unwrap();
        assert_eq!(core.api_path(), "/api/v1");
        assert_eq!(core.api_version(), "v1");

        let apps: GroupVersion = "apps/v1".parse().unwrap();
        assert_eq!(apps.api_path(), "/apis/apps/v1");
        assert_eq!(apps.api_version(), "apps/v1");

        assert!("apps/".parse::<GroupVersion>().is_err());
        assert!("".parse::<GroupVersion>().is_err());
    }

    #[test]
    fn resource_display() {
        assert_eq!(GroupVersionResource::gvr("", "v1", "pods").to_string(), "v1/pods");
        assert_eq!(
            GroupVersionResource::gvr("example.com", "v1", "widgets").to_string(),
            "example.com/v1/widgets"
        );
        assert_eq!(GroupVersionKind::gvk("apps", "v1", "Deployment").api_version(), "apps/v1");
    }
}
