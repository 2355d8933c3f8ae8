use std::collections::HashMap;

use serde_json::Value;

use crate::error::Result;
use crate::http::Method;
use crate::route::builder::RouteBuilder;
use crate::route::definition::RouteDefinition;

/// Scoped aggregation of group-level route settings.
///
/// Built inline at the `group()` call site; applied to every builder the
/// registrar creates while the group scope is active.
#[derive(Debug, Clone, Default)]
pub struct RouteGroupContext {
    prefix: String,
    middleware: Vec<String>,
    domain: Option<String>,
    authorization: Option<String>,
    name_prefix: String,
    constraints: HashMap<String, String>,
    defaults: HashMap<String, Value>,
    attributes: HashMap<String, Value>,
}

impl RouteGroupContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Path prefix prepended to every route in the group.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Middleware prepended (group-then-own order) to every route.
    #[must_use]
    pub fn middleware<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.middleware.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Host pattern applied to routes that do not set their own.
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Authorization policy applied to routes that do not set their own.
    #[must_use]
    pub fn authorize(mut self, policy: impl Into<String>) -> Self {
        self.authorization = Some(policy.into());
        self
    }

    /// Name prefix; a route named `own` inside the group becomes
    /// `prefix.own`.
    #[must_use]
    pub fn name(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    /// Constraint inherited by routes that do not declare their own for the
    /// same parameter.
    #[must_use]
    pub fn constraint(mut self, param: impl Into<String>, fragment: impl Into<String>) -> Self {
        self.constraints.insert(param.into(), fragment.into());
        self
    }

    /// Default inherited by routes that do not declare their own.
    #[must_use]
    pub fn default_value(mut self, param: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(param.into(), value);
        self
    }

    /// Annotation inherited by routes that do not declare their own.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Merge this context into a builder: prefix prepends, middleware and
    /// maps merge group-then-own (own wins), domain/authorization override
    /// only when the group specifies them, names concatenate as
    /// `group.own`.
    pub fn apply_to(&self, builder: &mut RouteBuilder) {
        builder.prepend_path_prefix(&self.prefix);
        builder.prepend_middleware(&self.middleware);
        builder.merge_constraints(&self.constraints);
        builder.merge_defaults(&self.defaults);
        builder.merge_attributes(&self.attributes);
        if let Some(domain) = &self.domain {
            builder.override_domain(domain);
        }
        if let Some(policy) = &self.authorization {
            builder.override_authorization(policy);
        }
        builder.append_name_prefix(&self.name_prefix);
    }

    /// Fold a stack of nested contexts (outermost first) into one merged
    /// context, so a builder only needs a single `apply_to` pass.
    fn fold(stack: &[RouteGroupContext]) -> RouteGroupContext {
        let mut merged = RouteGroupContext::new();
        for ctx in stack {
            if !ctx.prefix.is_empty() {
                merged.prefix = format!(
                    "{}/{}",
                    merged.prefix.trim_end_matches('/'),
                    ctx.prefix.trim_start_matches('/')
                );
            }
            merged.middleware.extend(ctx.middleware.iter().cloned());
            if !ctx.name_prefix.is_empty() {
                merged.name_prefix = if merged.name_prefix.is_empty() {
                    ctx.name_prefix.clone()
                } else {
                    format!("{}.{}", merged.name_prefix, ctx.name_prefix)
                };
            }
            // Inner groups override outer ones.
            for (k, v) in &ctx.constraints {
                merged.constraints.insert(k.clone(), v.clone());
            }
            for (k, v) in &ctx.defaults {
                merged.defaults.insert(k.clone(), v.clone());
            }
            for (k, v) in &ctx.attributes {
                merged.attributes.insert(k.clone(), v.clone());
            }
            if ctx.domain.is_some() {
                merged.domain = ctx.domain.clone();
            }
            if ctx.authorization.is_some() {
                merged.authorization = ctx.authorization.clone();
            }
        }
        merged
    }
}

/// Route declaration collector.
///
/// Owns its group-context stack, so two registrars never observe each other's
/// in-progress group state, which keeps concurrent bootstraps and parallel
/// test suites isolated. Builders created through the verb helpers are
/// finalized by an explicit [`flush`](Registrar::flush); dropping a
/// registrar registers nothing.
#[derive(Debug, Default)]
pub struct Registrar {
    stack: Vec<RouteGroupContext>,
    builders: Vec<RouteBuilder>,
}

impl Registrar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a builder for an arbitrary method, applying the active group
    /// context.
    pub fn route(&mut self, method: Method, path: impl Into<String>) -> Result<&mut RouteBuilder> {
        let mut builder = RouteBuilder::make(method, path)?;
        if !self.stack.is_empty() {
            RouteGroupContext::fold(&self.stack).apply_to(&mut builder);
        }
        self.builders.push(builder);
        #[allow(clippy::expect_used)]
        Ok(self.builders.last_mut().expect("builder was just pushed"))
    }

    pub fn get(&mut self, path: impl Into<String>) -> Result<&mut RouteBuilder> {
        self.route(Method::Get, path)
    }

    pub fn post(&mut self, path: impl Into<String>) -> Result<&mut RouteBuilder> {
        self.route(Method::Post, path)
    }

    pub fn put(&mut self, path: impl Into<String>) -> Result<&mut RouteBuilder> {
        self.route(Method::Put, path)
    }

    pub fn patch(&mut self, path: impl Into<String>) -> Result<&mut RouteBuilder> {
        self.route(Method::Patch, path)
    }

    pub fn delete(&mut self, path: impl Into<String>) -> Result<&mut RouteBuilder> {
        self.route(Method::Delete, path)
    }

    pub fn head(&mut self, path: impl Into<String>) -> Result<&mut RouteBuilder> {
        self.route(Method::Head, path)
    }

    pub fn options(&mut self, path: impl Into<String>) -> Result<&mut RouteBuilder> {
        self.route(Method::Options, path)
    }

    /// Catch-all method route, consulted by the matcher after the literal
    /// request method.
    pub fn any(&mut self, path: impl Into<String>) -> Result<&mut RouteBuilder> {
        self.route(Method::Any, path)
    }

    /// Run `declare` with `ctx` pushed onto this registrar's group stack.
    ///
    /// The context is popped on every exit path, including unwinding out of
    /// the callback.
    pub fn group<F>(&mut self, ctx: RouteGroupContext, declare: F)
    where
        F: FnOnce(&mut Registrar),
    {
        self.stack.push(ctx);
        struct PopGuard<'a> {
            registrar: &'a mut Registrar,
        }
        impl Drop for PopGuard<'_> {
            fn drop(&mut self) {
                self.registrar.stack.pop();
            }
        }
        let mut guard = PopGuard { registrar: self };
        declare(&mut *guard.registrar);
    }

    /// Number of pending builders.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.builders.len()
    }

    /// Finalize every pending builder, draining them from the registrar.
    ///
    /// The first build failure aborts the flush; already-drained builders
    /// are not restored (registration failures are bootstrap-fatal anyway).
    pub fn flush(&mut self) -> Result<Vec<RouteDefinition>> {
        let builders = std::mem::take(&mut self.builders);
        let mut routes = Vec::with_capacity(builders.len());
        for builder in &builders {
            routes.push(builder.build()?);
        }
        Ok(routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_prefix_and_middleware_compose() {
        let mut registrar = Registrar::new();
        registrar.group(
            RouteGroupContext::new().prefix("/api/v1").middleware(["auth"]),
            |r| {
                r.get("/ping").unwrap().handler("ping");
            },
        );
        let routes = registrar.flush().unwrap();
        assert_eq!(routes[0].path(), "/api/v1/ping");
        assert_eq!(routes[0].middleware(), ["auth"]);
    }

    #[test]
    fn nested_groups_apply_outer_first() {
        let mut registrar = Registrar::new();
        registrar.group(
            RouteGroupContext::new().prefix("/api").middleware(["outer"]).name("api"),
            |r| {
                r.group(
                    RouteGroupContext::new().prefix("/v1").middleware(["inner"]).name("v1"),
                    |r| {
                        r.get("/ping").unwrap().handler("ping").name("ping");
                    },
                );
            },
        );
        let routes = registrar.flush().unwrap();
        assert_eq!(routes[0].path(), "/api/v1/ping");
        assert_eq!(routes[0].middleware(), ["outer", "inner"]);
        assert_eq!(routes[0].name(), "api.v1.ping");
    }

    #[test]
    fn group_scope_ends_after_callback() {
        let mut registrar = Registrar::new();
        registrar.group(RouteGroupContext::new().prefix("/api"), |r| {
            r.get("/inside").unwrap().handler("h");
        });
        registrar.get("/outside").unwrap().handler("h");
        let routes = registrar.flush().unwrap();
        assert_eq!(routes[0].path(), "/api/inside");
        assert_eq!(routes[1].path(), "/outside");
    }

    #[test]
    fn group_pops_on_unwind() {
        let mut registrar = Registrar::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            registrar.group(RouteGroupContext::new().prefix("/api"), |_| {
                panic!("declaration failure");
            });
        }));
        assert!(result.is_err());
        registrar.get("/after").unwrap().handler("h");
        let routes = registrar.flush().unwrap();
        assert_eq!(routes[0].path(), "/after");
    }

    #[test]
    fn own_settings_win_over_group() {
        let mut registrar = Registrar::new();
        registrar.group(
            RouteGroupContext::new()
                .constraint("id", "[0-9]+")
                .domain("api.example.com"),
            |r| {
                r.get("/users/{id}")
                    .unwrap()
                    .handler("h")
                    .constraint("id", "[a-z]+")
                    .with_domain("admin.example.com");
            },
        );
        let routes = registrar.flush().unwrap();
        assert_eq!(routes[0].constraints()["id"], "[a-z]+");
        assert_eq!(routes[0].domain(), Some("admin.example.com"));
    }
}
