use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Error, Result};

/// A typed CloudFormation resource. Implementors serialize their own
/// `Properties` block and may reject invalid desired state before anything
/// is submitted to the engine.
pub trait CfnResource {
    fn type_string(&self) -> &'static str;
    fn properties(&self) -> Value;
    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// A declared resource: a logical name, the typed desired state, and any
/// explicit ordering edges beyond what attribute references already imply.
pub struct Resource {
    pub name: String,
    pub depends_on: Vec<String>,
    pub properties: Box<dyn CfnResource>,
}

impl Resource {
    pub fn new(name: impl Into<String>, properties: impl CfnResource + 'static) -> Self {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
            properties: Box::new(properties),
        }
    }

    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        self.depends_on.push(logical_id.into());
        self
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SavedResource {
    #[serde(rename = "Type")]
    pub ty: String,
    #[serde(rename = "Properties")]
    pub properties: Value,
    #[serde(rename = "DependsOn", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SavedTemplate {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub version: String,
    #[serde(rename = "Resources")]
    pub resources: HashMap<String, SavedResource>,
    #[serde(rename = "Outputs", default, skip_serializing_if = "HashMap::is_empty")]
    pub outputs: HashMap<String, ResourceOutput>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResourceOutput {
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Value")]
    pub value: Value,
}

impl Default for SavedTemplate {
    fn default() -> Self {
        Self {
            version: "2010-09-09".to_string(),
            resources: Default::default(),
            outputs: Default::default(),
        }
    }
}

impl SavedTemplate {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Pretty so that the template stays readable in the CloudFormation
    /// console and in dry-run output.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Validate every declared resource and collect them into a template.
pub fn resources_to_template(
    resources: Vec<Resource>,
    outputs: HashMap<String, ResourceOutput>,
) -> Result<SavedTemplate> {
    let mut out_template = SavedTemplate {
        outputs,
        ..Default::default()
    };
    for resource in resources {
        if let Err(reason) = resource.properties.validate() {
            return Err(Error::InvalidResource {
                name: resource.name,
                reason,
            });
        }
        let saved = SavedResource {
            ty: resource.properties.type_string().to_string(),
            properties: resource.properties.properties(),
            depends_on: resource.depends_on,
        };
        out_template.resources.insert(resource.name, saved);
    }
    Ok(out_template)
}

/// `{ "Ref": name }`
pub fn get_ref(logical_id: &str) -> Value {
    serde_json::json!({ "Ref": logical_id })
}

/// `{ "Fn::GetAtt": [name, attribute] }`
pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    serde_json::json!({ "Fn::GetAtt": [logical_id, attribute] })
}

/// `{ "Fn::Sub": expr }`
pub fn sub(expr: &str) -> Value {
    serde_json::json!({ "Fn::Sub": expr })
}

/// Derive a CloudFormation logical id from a prefix and the project name.
/// Logical ids must be strictly alphanumeric.
pub fn logical_id(prefix: &str, project_name: &str) -> String {
    let mut out = format!("{prefix}{project_name}");
    out.retain(|c| c.is_ascii_alphanumeric());
    out
}

/// A stack name can contain only alphanumeric characters (case sensitive)
/// and hyphens. It must start with an alphabetical character and can't be
/// longer than 128 characters.
pub fn validate_stack_name(project_name: &str, current_stack_name: &str) -> Result<String> {
    let stack_name = if current_stack_name.is_empty() {
        let mut stack_name = project_name.to_string();
        stack_name = stack_name.replace('_', "-");
        stack_name.truncate(128);
        stack_name
    } else {
        current_stack_name.to_string()
    };
    let restriction = "Must only consist of alphanumeric characters and hyphens, \
        must start with an alphabetical character, and cannot be longer than 128 characters.";
    for (i, c) in stack_name.chars().enumerate() {
        if i == 0 && !c.is_ascii_alphabetic() {
            return Err(Error::InvalidStackName {
                name: stack_name.clone(),
                reason: restriction.to_string(),
            });
        }
        if !c.is_ascii_alphanumeric() && c != '-' {
            return Err(Error::InvalidStackName {
                name: stack_name.clone(),
                reason: restriction.to_string(),
            });
        }
    }
    if stack_name.len() > 128 {
        return Err(Error::InvalidStackName {
            name: stack_name,
            reason: restriction.to_string(),
        });
    }
    Ok(stack_name)
}
