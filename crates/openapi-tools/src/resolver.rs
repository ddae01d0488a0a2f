//! Local `$ref` resolver.
//!
//! The `openapiv3` crate models `$ref`s as `ReferenceOr<T>` but does not resolve them. The
//! ThetaData spec is a single self-contained document, so only local component refs
//! (`#/components/<section>/<name>`) are supported. Chains of refs are followed up to a fixed
//! depth to guard against cycles.

use crate::error::{OpenApiToolsError, Result};
use openapiv3::{Components, OpenAPI, Parameter, ReferenceOr, RequestBody, Response, Schema};

const MAX_REF_DEPTH: usize = 16;

#[derive(Clone, Copy)]
pub struct RefResolver<'a> {
    spec: &'a OpenAPI,
}

impl<'a> RefResolver<'a> {
    #[must_use]
    pub fn new(spec: &'a OpenAPI) -> Self {
        Self { spec }
    }

    /// # Errors
    ///
    /// Returns an error if the ref is not local, dangling, or cyclic.
    pub fn parameter(&self, item: &'a ReferenceOr<Parameter>) -> Result<&'a Parameter> {
        self.resolve(item, "parameters", |c, name| c.parameters.get(name))
    }

    /// # Errors
    ///
    /// Returns an error if the ref is not local, dangling, or cyclic.
    pub fn request_body(&self, item: &'a ReferenceOr<RequestBody>) -> Result<&'a RequestBody> {
        self.resolve(item, "requestBodies", |c, name| c.request_bodies.get(name))
    }

    /// # Errors
    ///
    /// Returns an error if the ref is not local, dangling, or cyclic.
    pub fn response(&self, item: &'a ReferenceOr<Response>) -> Result<&'a Response> {
        self.resolve(item, "responses", |c, name| c.responses.get(name))
    }

    /// # Errors
    ///
    /// Returns an error if the ref is not local, dangling, or cyclic.
    pub fn schema(&self, item: &'a ReferenceOr<Schema>) -> Result<&'a Schema> {
        self.resolve(item, "schemas", |c, name| c.schemas.get(name))
    }

    /// Resolve a nested (boxed) schema, as found in `items` and `properties`.
    ///
    /// # Errors
    ///
    /// Returns an error if the ref is not local, dangling, or cyclic.
    pub fn boxed_schema(&self, item: &'a ReferenceOr<Box<Schema>>) -> Result<&'a Schema> {
        match item {
            ReferenceOr::Item(schema) => Ok(schema),
            ReferenceOr::Reference { reference } => {
                let target = self.lookup(reference, "schemas", |c, name| c.schemas.get(name))?;
                self.schema(target)
            }
        }
    }

    fn resolve<T>(
        &self,
        item: &'a ReferenceOr<T>,
        section: &str,
        get: impl Fn(&'a Components, &str) -> Option<&'a ReferenceOr<T>>,
    ) -> Result<&'a T> {
        let mut current = item;
        for _ in 0..MAX_REF_DEPTH {
            match current {
                ReferenceOr::Item(value) => return Ok(value),
                ReferenceOr::Reference { reference } => {
                    current = self.lookup(reference, section, &get)?;
                }
            }
        }
        Err(OpenApiToolsError::OpenApi(format!(
            "$ref chain in components/{section} is deeper than {MAX_REF_DEPTH} (cycle?)"
        )))
    }

    fn lookup<T>(
        &self,
        reference: &str,
        section: &str,
        get: impl Fn(&'a Components, &str) -> Option<&'a ReferenceOr<T>>,
    ) -> Result<&'a ReferenceOr<T>> {
        let name = local_ref_name(reference, section).ok_or_else(|| {
            OpenApiToolsError::OpenApi(format!(
                "Unsupported $ref '{reference}' (only #/components/{section}/... is supported)"
            ))
        })?;
        self.spec
            .components
            .as_ref()
            .and_then(|c| get(c, name))
            .ok_or_else(|| OpenApiToolsError::OpenApi(format!("Unresolved $ref '{reference}'")))
    }
}

fn local_ref_name<'r>(reference: &'r str, section: &str) -> Option<&'r str> {
    reference
        .strip_prefix("#/components/")?
        .strip_prefix(section)?
        .strip_prefix('/')
        .filter(|name| !name.is_empty() && !name.contains('/'))
}
