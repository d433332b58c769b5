use std::collections::HashMap;

/// Built-in command templates.
///
/// Templates are compile-time constants: a multi-line command block with
/// `{variable}` tokens and the ordered list of variables it references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateId {
    Deployment,
    DockerBuildPush,
    VersionControl,
    CloudCli,
    Blank,
}

impl TemplateId {
    /// The fixed catalog, in display order
    pub fn all() -> &'static [TemplateId] {
        &[
            TemplateId::Deployment,
            TemplateId::DockerBuildPush,
            TemplateId::VersionControl,
            TemplateId::CloudCli,
            TemplateId::Blank,
        ]
    }

    /// Stable identifier used on the CLI and in the UI picker
    pub fn id(&self) -> &'static str {
        match self {
            TemplateId::Deployment => "deploy",
            TemplateId::DockerBuildPush => "docker",
            TemplateId::VersionControl => "git",
            TemplateId::CloudCli => "cloud",
            TemplateId::Blank => "blank",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TemplateId::Deployment => "Deployment over SSH",
            TemplateId::DockerBuildPush => "Docker build and push",
            TemplateId::VersionControl => "Git commit and push",
            TemplateId::CloudCli => "Cloud CLI sync",
            TemplateId::Blank => "Blank",
        }
    }

    pub fn parse(id: &str) -> Option<TemplateId> {
        TemplateId::all().iter().copied().find(|t| t.id() == id)
    }

    /// The raw placeholder text, `{variable}` tokens included
    pub fn placeholder(&self) -> &'static str {
        match self {
            TemplateId::Deployment => {
                "ssh {user}@{host} 'cd {app_dir} && git pull'\nssh {user}@{host} 'cd {app_dir} && ./restart.sh'"
            }
            TemplateId::DockerBuildPush => {
                "docker build -t {image_name}:{tag} .\ndocker push {image_name}:{tag}"
            }
            TemplateId::VersionControl => {
                "git add .\ngit commit -m \"{message}\"\ngit push origin {branch}"
            }
            TemplateId::CloudCli => {
                "aws configure set region {region}\naws s3 sync {local_dir} s3://{bucket}"
            }
            TemplateId::Blank => "",
        }
    }

    /// Variable names referenced by the placeholder, in fill-in order
    pub fn variables(&self) -> &'static [&'static str] {
        match self {
            TemplateId::Deployment => &["user", "host", "app_dir"],
            TemplateId::DockerBuildPush => &["image_name", "tag"],
            TemplateId::VersionControl => &["message", "branch"],
            TemplateId::CloudCli => &["region", "local_dir", "bucket"],
            TemplateId::Blank => &[],
        }
    }

    /// Substitute supplied values into the placeholder text.
    ///
    /// Every literal `{name}` occurrence of a supplied variable is replaced.
    /// Variables with no supplied value are left verbatim so callers can show
    /// the leftover token as an unfilled field. Keys that are not declared
    /// variables are ignored.
    pub fn expand(&self, values: &HashMap<String, String>) -> String {
        let mut text = self.placeholder().to_string();
        for name in self.variables() {
            if let Some(value) = values.get(*name) {
                text = text.replace(&format!("{{{}}}", name), value);
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn docker_expansion_fills_every_occurrence() {
        let t = TemplateId::parse("docker").unwrap();
        let out = t.expand(&values(&[("image_name", "myapp"), ("tag", "v1")]));
        assert_eq!(out, "docker build -t myapp:v1 .\ndocker push myapp:v1");
    }

    #[test]
    fn missing_value_leaves_token_intact() {
        let t = TemplateId::DockerBuildPush;
        let out = t.expand(&values(&[("image_name", "myapp")]));
        assert_eq!(out, "docker build -t myapp:{tag} .\ndocker push myapp:{tag}");
    }

    #[test]
    fn undeclared_keys_are_ignored() {
        let t = TemplateId::DockerBuildPush;
        let out = t.expand(&values(&[("nonsense", "x")]));
        assert_eq!(out, t.placeholder());
    }

    #[test]
    fn blank_template_has_no_variables() {
        assert!(TemplateId::Blank.variables().is_empty());
        assert_eq!(TemplateId::Blank.expand(&HashMap::new()), "");
    }

    #[test]
    fn declared_variables_occur_in_placeholder() {
        for t in TemplateId::all() {
            for var in t.variables() {
                assert!(
                    t.placeholder().contains(&format!("{{{}}}", var)),
                    "{} missing {{{}}}",
                    t.id(),
                    var
                );
            }
        }
    }

    #[test]
    fn ids_round_trip_through_parse() {
        for t in TemplateId::all() {
            assert_eq!(TemplateId::parse(t.id()), Some(*t));
        }
        assert_eq!(TemplateId::parse("unknown"), None);
    }
}
