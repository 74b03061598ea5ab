//! Command, overload and parameter definitions.

use crate::arguments::Arguments;
use crate::context::{ContextCapability, ExecutionContext, Scope};
use crate::result::InvocationResult;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// What a handler returns. Any `Err` is treated as a handler fault.
pub type HandlerResult = anyhow::Result<InvocationResult>;

/// Named permission a principal may hold in a channel or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Owner,
    ManageGroup,
    ManageMessages,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Owner => "Bot Owner",
            Capability::ManageGroup => "Manage Group",
            Capability::ManageMessages => "Manage Messages",
        };
        f.write_str(name)
    }
}

/// Declared semantic type of a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Integer,
    Unsigned,
    Float,
    Boolean,
    /// Matches one member name, case-insensitively.
    Enum(Vec<String>),
    /// Absolute point in time.
    DateTime,
    /// Relative offset such as `3h`.
    Duration,
    Text,
    TextList,
}

impl ParamKind {
    pub fn enumeration<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ParamKind::Enum(members.into_iter().map(Into::into).collect())
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ParamKind::Integer => "whole number",
            ParamKind::Unsigned => "non-negative whole number",
            ParamKind::Float => "number",
            ParamKind::Boolean => "true or false",
            ParamKind::Enum(_) => "choice",
            ParamKind::DateTime => "date/time",
            ParamKind::Duration => "duration",
            ParamKind::Text => "text",
            ParamKind::TextList => "list",
        }
    }
}

/// A bound, typed argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Boolean(bool),
    Enum(String),
    DateTime(DateTime<FixedOffset>),
    Duration(Duration),
    Text(String),
    TextList(Vec<String>),
}

/// One parameter of an overload.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParamKind,
    pub optional: bool,
    pub default: Option<Value>,
    pub remainder: bool,
    pub display_name: Option<String>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            optional: false,
            default: None,
            remainder: false,
            display_name: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Integer)
    }

    pub fn unsigned(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Unsigned)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Float)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Boolean)
    }

    pub fn date_time(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::DateTime)
    }

    pub fn duration(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Duration)
    }

    pub fn choice<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, ParamKind::enumeration(members))
    }

    /// Optional with no default; binds to nothing when omitted.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Optional, binding `value` when omitted.
    pub fn default_value(mut self, value: Value) -> Self {
        self.optional = true;
        self.default = Some(value);
        self
    }

    /// Captures every remaining token.
    pub fn remainder(mut self) -> Self {
        self.remainder = true;
        self
    }

    pub fn display(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// `<name>`, `<~name>`, `<name...>` or `<~name...>`.
    pub fn usage(&self) -> String {
        format!(
            "<{}{}{}>",
            if self.optional { "~" } else { "" },
            self.label(),
            if self.remainder { "..." } else { "" }
        )
    }
}

/// Executes one overload.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, ctx: &ExecutionContext, args: Arguments) -> HandlerResult;
}

/// Handler backed by an async closure taking an owned context.
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(ExecutionContext, Arguments) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn call(&self, ctx: &ExecutionContext, args: Arguments) -> HandlerResult {
        (self.0)(ctx.clone(), args).await
    }
}

/// Wrap an async closure as a handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn Handler>
where
    F: Fn(ExecutionContext, Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// One concrete parameter shape and handler under a command name.
#[derive(Clone)]
pub struct Overload {
    pub params: Vec<ParameterSpec>,
    pub priority: i32,
    pub scopes: Vec<Scope>,
    pub required: Vec<Capability>,
    pub needs: Vec<ContextCapability>,
    pub handler: Arc<dyn Handler>,
    /// Position within the owning command, assigned on insertion.
    pub declaration: usize,
}

impl Overload {
    /// New overload usable in every scope with the lowest priority.
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self {
            params: Vec::new(),
            priority: i32::MIN,
            scopes: Scope::ALL.to_vec(),
            required: Vec::new(),
            needs: Vec::new(),
            handler,
            declaration: 0,
        }
    }

    pub fn param(mut self, param: ParameterSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn scopes(mut self, scopes: &[Scope]) -> Self {
        self.scopes = scopes.to_vec();
        self
    }

    pub fn require(mut self, capability: Capability) -> Self {
        self.required.push(capability);
        self
    }

    pub fn needs(mut self, capability: ContextCapability) -> Self {
        self.needs.push(capability);
        self
    }

    pub fn allows(&self, scope: Scope) -> bool {
        self.scopes.contains(&scope)
    }

    pub fn has_remainder(&self) -> bool {
        self.params.last().map(|p| p.remainder).unwrap_or(false)
    }

    /// Minimum and maximum token counts this overload can bind.
    /// `None` means unbounded (remainder capture).
    pub fn arity(&self) -> (usize, Option<usize>) {
        let min = self.params.iter().filter(|p| !p.optional).count();
        if self.has_remainder() {
            (min, None)
        } else {
            (min, Some(self.params.len()))
        }
    }

    pub fn accepts_count(&self, count: usize) -> bool {
        let (min, max) = self.arity();
        count >= min && max.map(|m| count <= m).unwrap_or(true)
    }

    /// `<prefix><name> <param1> <~param2> <rest...>`.
    pub fn usage(&self, prefix: &str, name: &str) -> String {
        let mut usage = format!("{}{}", prefix, name);
        for param in &self.params {
            usage.push(' ');
            usage.push_str(&param.usage());
        }
        usage
    }
}

impl fmt::Debug for Overload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overload")
            .field("params", &self.params)
            .field("priority", &self.priority)
            .field("scopes", &self.scopes)
            .field("required", &self.required)
            .field("declaration", &self.declaration)
            .finish_non_exhaustive()
    }
}

/// A named command with aliases and overloads.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub name: String,
    pub aliases: Vec<String>,
    pub overloads: Vec<Overload>,
    pub help: String,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            overloads: Vec::new(),
            help: String::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn overload(mut self, mut overload: Overload) -> Self {
        overload.declaration = self.overloads.len();
        self.overloads.push(overload);
        self
    }

    /// Primary name followed by every alias.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(|a| a.as_str()))
    }

    /// Overloads in resolution order: descending priority, then
    /// declaration order.
    pub fn resolution_order(&self) -> Vec<&Overload> {
        let mut ordered: Vec<&Overload> = self.overloads.iter().collect();
        ordered.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.declaration.cmp(&b.declaration))
        });
        ordered
    }

    pub fn usages(&self, prefix: &str) -> Vec<String> {
        self.resolution_order()
            .into_iter()
            .map(|o| o.usage(prefix, &self.name))
            .collect()
    }

    pub fn allows(&self, scope: Scope) -> bool {
        self.overloads.iter().any(|o| o.allows(scope))
    }

    /// Union of the scopes every overload permits, in canonical order.
    pub fn allowed_scopes(&self) -> Vec<Scope> {
        Scope::ALL
            .iter()
            .copied()
            .filter(|s| self.allows(*s))
            .collect()
    }
}
