use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

use super::error::RouteError;
use super::pattern::PathPattern;
use crate::dispatcher::Handler;

/// HTTP methods accepted by a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodSet {
    /// The `all` sentinel: every method is accepted.
    All,
    /// An explicit, non-empty list of methods.
    Only(SmallVec<[Method; 2]>),
}

impl MethodSet {
    /// Build an explicit set, dropping duplicates. Returns `None` for an empty list.
    #[must_use]
    pub fn only(methods: &[Method]) -> Option<Self> {
        let mut set: SmallVec<[Method; 2]> = SmallVec::new();
        for m in methods {
            if !set.contains(m) {
                set.push(m.clone());
            }
        }
        (!set.is_empty()).then_some(MethodSet::Only(set))
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, method: &Method) -> bool {
        match self {
            MethodSet::All => true,
            MethodSet::Only(methods) => methods.contains(method),
        }
    }

    /// First method present in both sets, if any.
    #[must_use]
    pub fn overlap(&self, other: &MethodSet) -> Option<String> {
        match (self, other) {
            (MethodSet::All, MethodSet::All) => Some("ALL".to_string()),
            (MethodSet::All, MethodSet::Only(m)) | (MethodSet::Only(m), MethodSet::All) => {
                m.first().map(ToString::to_string)
            }
            (MethodSet::Only(a), MethodSet::Only(b)) => {
                a.iter().find(|m| b.contains(m)).map(ToString::to_string)
            }
        }
    }

    /// Methods in the set; empty for [`MethodSet::All`].
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        match self {
            MethodSet::All => &[],
            MethodSet::Only(methods) => methods,
        }
    }
}

impl fmt::Display for MethodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodSet::All => f.write_str("ALL"),
            MethodSet::Only(methods) => {
                for (i, m) in methods.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str(m.as_str())?;
                }
                Ok(())
            }
        }
    }
}

/// Declared schema for one path parameter, compiled at registration.
#[derive(Clone)]
pub struct ParamSchema {
    schema: Value,
    validator: Arc<jsonschema::Validator>,
}

impl ParamSchema {
    pub fn compile(schema: Value) -> Result<Self, String> {
        let validator = jsonschema::validator_for(&schema).map_err(|e| e.to_string())?;
        Ok(Self {
            schema,
            validator: Arc::new(validator),
        })
    }

    #[must_use]
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    #[must_use]
    pub fn is_valid(&self, value: &Value) -> bool {
        self.validator.is_valid(value)
    }
}

impl fmt::Debug for ParamSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamSchema")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// A registered (methods, path, handler) binding.
///
/// Created by the verb registrars on [`super::RouterBuilder`] and immutable
/// once the router is built.
#[derive(Clone)]
pub struct Route {
    pub(crate) methods: MethodSet,
    pub(crate) pattern: PathPattern,
    pub(crate) handler: Arc<dyn Handler>,
    pub(crate) schemas: Vec<(Arc<str>, ParamSchema)>,
    pub(crate) name: Option<Arc<str>>,
}

impl Route {
    pub(crate) fn new(methods: MethodSet, pattern: PathPattern, handler: Arc<dyn Handler>) -> Self {
        Self {
            methods,
            pattern,
            handler,
            schemas: Vec::new(),
            name: None,
        }
    }

    #[must_use]
    pub fn methods(&self) -> &MethodSet {
        &self.methods
    }

    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    #[must_use]
    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Declared schemas, in declaration order.
    pub fn param_schemas(&self) -> impl Iterator<Item = (&str, &ParamSchema)> + '_ {
        self.schemas.iter().map(|(n, s)| (n.as_ref(), s))
    }

    /// Short human-readable label, e.g. `GET /users/:id (get_user)`.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.name {
            Some(name) => format!("{} {} ({name})", self.methods, self.pattern),
            None => format!("{} {}", self.methods, self.pattern),
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("methods", &self.methods)
            .field("pattern", &self.pattern.to_string())
            .field("name", &self.name)
            .field("handler", &self.handler.name())
            .field("schemas", &self.schemas)
            .finish()
    }
}

/// Handle returned by the verb registrars for optional route settings.
///
/// ```rust,ignore
/// api.get("/users/:id", get_user)?
///     .name("get_user")
///     .constraint("id", r"\d+")?
///     .param_schema("id", json!({ "type": "integer", "minimum": 1 }))?;
/// ```
pub struct RouteRef<'a> {
    route: &'a mut Route,
}

impl<'a> RouteRef<'a> {
    pub(crate) fn new(route: &'a mut Route) -> Self {
        Self { route }
    }

    /// Name the route for reverse lookup and diagnostics.
    pub fn name(mut self, name: &str) -> Self {
        self.route.name = Some(Arc::from(name));
        self
    }

    /// Only match when parameter `param` fully matches `regex`.
    pub fn constraint(mut self, param: &str, regex: &str) -> Result<Self, RouteError> {
        self.route.pattern.constrain(param, regex)?;
        Ok(self)
    }

    /// Declare the JSON schema a parameter's raw value must satisfy.
    pub fn param_schema(mut self, param: &str, schema: Value) -> Result<Self, RouteError> {
        let path = self.route.pattern.source().to_string();
        if !self.route.pattern.param_names().any(|n| n == param) {
            return Err(RouteError::UnknownParameter {
                path,
                name: param.to_string(),
            });
        }
        let compiled = ParamSchema::compile(schema).map_err(|message| RouteError::InvalidSchema {
            path,
            name: param.to_string(),
            message,
        })?;
        self.route.schemas.retain(|(n, _)| n.as_ref() != param);
        self.route.schemas.push((Arc::from(param), compiled));
        Ok(self)
    }
}
