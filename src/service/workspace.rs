//! The workspace object store client.

use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use crate::ObjectRef;
use crate::service::Client;
use crate::service::Error;
use crate::service::ObjectInfo;
use crate::service::ObjectStore;
use crate::service::Result;

/// The position of the object name within an object info tuple.
const INFO_NAME: usize = 1;

/// The position of the type name within an object info tuple.
const INFO_TYPE: usize = 2;

/// The result of `Workspace.get_objects2`.
#[derive(Debug, Deserialize)]
struct Objects {
    /// The returned objects.
    #[serde(default)]
    data: Vec<ObjectData>,
}

/// A single object returned by `Workspace.get_objects2`.
#[derive(Debug, Deserialize)]
struct ObjectData {
    /// The references this object holds to other objects.
    #[serde(default)]
    refs: Vec<String>,
}

/// The result of `Workspace.get_object_info3`.
#[derive(Debug, Deserialize)]
struct ObjectInfos {
    /// One object info tuple per requested reference.
    infos: Vec<Vec<Value>>,

    /// One resolved reference path per requested reference.
    paths: Vec<Vec<String>>,
}

/// A client for the workspace object store.
#[derive(Clone, Debug)]
pub struct Workspace {
    /// The JSON-RPC client.
    client: Client,
}

impl Workspace {
    /// Creates a new workspace client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ObjectStore for Workspace {
    fn get_object_refs(&self, reference: &ObjectRef) -> Result<Vec<String>> {
        let objects: Objects = self.client.call(
            "Workspace.get_objects2",
            &json!({
                "objects": [{ "ref": reference.to_string() }],
                "no_data": 1
            }),
        )?;

        Ok(objects
            .data
            .into_iter()
            .next()
            .map(|object| object.refs)
            .unwrap_or_default())
    }

    fn get_object_info(&self, references: &[String]) -> Result<Vec<ObjectInfo>> {
        let method = "Workspace.get_object_info3";
        let objects = references
            .iter()
            .map(|reference| json!({ "ref": reference }))
            .collect::<Vec<_>>();

        let result: ObjectInfos = self.client.call(method, &json!({ "objects": objects }))?;

        if result.infos.len() != result.paths.len() {
            return Err(Error::Malformed(
                method.to_string(),
                format!(
                    "{} infos but {} paths",
                    result.infos.len(),
                    result.paths.len()
                ),
            ));
        }

        result
            .infos
            .into_iter()
            .zip(result.paths)
            .map(|(info, path)| {
                let field = |index: usize| {
                    info.get(index)
                        .and_then(Value::as_str)
                        .map(String::from)
                        .ok_or_else(|| {
                            Error::Malformed(
                                method.to_string(),
                                format!("object info is missing field #{index}"),
                            )
                        })
                };

                Ok(ObjectInfo::new(field(INFO_NAME)?, field(INFO_TYPE)?, path))
            })
            .collect()
    }

    fn get_workspace_info(&self, name: &str) -> Result<()> {
        self.client
            .call::<_, Value>("Workspace.get_workspace_info", &json!({ "workspace": name }))
            .map(|_| ())
    }
}
