// SPDX-License-Identifier: MIT

//! Tree-walking evaluator for condition expressions
//!
//! Expressions go through length check, parse and allow-list validation
//! before any variable is read. Variables are fetched from the execution's
//! store only at the leaves that are actually reached, so `a && b` never
//! looks up `b` when `a` is falsy.

use super::ast::{
    BinaryOperator, Literal, LogicalOperator, MemberProperty, Node, PropertyKey, UnaryOperator,
};
use super::cache::AstCache;
use super::classifier::is_complex_expression;
use super::operator::{
    apply_operator, compare, is_empty, is_not_empty, loose_equals, strict_equals,
};
use super::parser::{check_length, is_reserved_word, parse_with_limits};
use super::structured::Condition;
use super::validator::{check_property_name, validate};
use crate::core::config::EvaluatorConfig;
use crate::core::context::ExecutionContext;
use crate::core::error::EvalError;
use crate::core::value::Value;
use crate::pattern::{RegexService, SafeRegex};
use futures::future::{BoxFuture, FutureExt};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Evaluates condition expressions against an execution's variables
pub struct ConditionEvaluator {
    config: EvaluatorConfig,
    regex: Arc<dyn RegexService>,
    cache: Option<AstCache>,
}

impl ConditionEvaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        let regex = Arc::new(SafeRegex::new(config.regex.clone()));
        Self::with_regex_service(config, regex)
    }

    pub fn with_regex_service(config: EvaluatorConfig, regex: Arc<dyn RegexService>) -> Self {
        let cache = (config.cache_capacity > 0).then(|| AstCache::new(config.cache_capacity));
        Self {
            config,
            regex,
            cache,
        }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&AstCache> {
        self.cache.as_ref()
    }

    /// Length check, parse and validate; the result is cached per workflow
    /// version when the cache is enabled
    pub async fn compile(&self, expression: &str, version: u32) -> Result<Arc<Node>, EvalError> {
        check_length(expression, self.config.max_expression_length)?;

        if let Some(cache) = &self.cache {
            if let Some(node) = cache.get(version, expression).await {
                return Ok(node);
            }
        }

        let node = parse_with_limits(
            expression,
            self.config.max_expression_length,
            self.config.max_depth,
        )?;
        validate(&node)?;
        let node = Arc::new(node);

        if let Some(cache) = &self.cache {
            cache.insert(version, expression, node.clone()).await;
        }
        Ok(node)
    }

    /// Evaluate an expression to a value
    pub async fn evaluate(
        &self,
        expression: &str,
        ctx: &ExecutionContext,
    ) -> Result<Value, EvalError> {
        let node = self.compile(expression, ctx.version).await?;
        ctx.logger
            .debug(&format!("Evaluating condition: {}", expression));
        self.eval_node(&node, ctx).await
    }

    /// Evaluate an expression for branching.
    ///
    /// Plain literals and variable paths are resolved directly; everything
    /// else goes through [`ConditionEvaluator::evaluate`].
    pub async fn evaluate_condition(
        &self,
        expression: &str,
        ctx: &ExecutionContext,
    ) -> Result<bool, EvalError> {
        check_length(expression, self.config.max_expression_length)?;

        if !is_complex_expression(expression) {
            if let Some(value) = self.resolve_plain(expression, ctx).await? {
                return Ok(value.is_truthy());
            }
        }

        Ok(self.evaluate(expression, ctx).await?.is_truthy())
    }

    /// Evaluate a structured `{ field, operator, value }` condition
    pub async fn evaluate_structured(
        &self,
        condition: &Condition,
        ctx: &ExecutionContext,
    ) -> Result<Value, EvalError> {
        let field = condition.field.trim();
        if field.is_empty() {
            return Err(EvalError::evaluation("condition has no field"));
        }
        for segment in field.split('.') {
            check_property_name(segment)?;
        }

        let left = self.resolve_path(field, ctx).await?;
        let right = Value::from(condition.value.clone());
        Ok(apply_operator(
            &left,
            condition.operator,
            &right,
            condition.case_sensitive,
        ))
    }

    /// Literal or dotted variable path, `None` for anything else
    async fn resolve_plain(
        &self,
        expression: &str,
        ctx: &ExecutionContext,
    ) -> Result<Option<Value>, EvalError> {
        let text = expression.trim();

        match text {
            "true" => return Ok(Some(Value::Bool(true))),
            "false" => return Ok(Some(Value::Bool(false))),
            "null" => return Ok(Some(Value::Null)),
            "undefined" => return Ok(Some(Value::Undefined)),
            _ => {}
        }

        if let Some(s) = plain_string(text) {
            return Ok(Some(Value::String(s.to_string())));
        }

        if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Ok(text.parse::<f64>().ok().map(Value::Number));
        }

        if is_plain_path(text) {
            return self.resolve_path(text, ctx).await.map(Some);
        }

        Ok(None)
    }

    /// Fetch the root of a dotted path once and walk the rest in memory.
    /// A missing root falls back to the whole dotted key.
    async fn resolve_path(&self, path: &str, ctx: &ExecutionContext) -> Result<Value, EvalError> {
        let mut segments = path.split('.');
        let root = segments.next().unwrap_or_default();
        let rest: Vec<&str> = segments.collect();

        match ctx.variables.get(root).await? {
            Some(value) => Ok(rest
                .iter()
                .fold(Value::from(value), |current, name| current.property(name))),
            None if !rest.is_empty() => Ok(Value::from(ctx.variables.get(path).await?)),
            None => Ok(Value::Undefined),
        }
    }

    fn eval_node<'a>(
        &'a self,
        node: &'a Node,
        ctx: &'a ExecutionContext,
    ) -> BoxFuture<'a, Result<Value, EvalError>> {
        async move {
            match node {
                Node::Literal(literal) => Ok(literal_value(literal)),
                Node::Identifier(name) => Ok(Value::from(ctx.variables.get(name).await?)),
                Node::Member { object, property } => {
                    if let Some(path) = node.static_path() {
                        return self.resolve_path(&path, ctx).await;
                    }
                    let base = self.eval_node(object, ctx).await?;
                    match property {
                        MemberProperty::Named(name) => Ok(base.property(name)),
                        MemberProperty::Computed(index) => {
                            let index = self.eval_node(index, ctx).await?;
                            Ok(base.index(&index))
                        }
                    }
                }
                Node::Call { callee, arguments } => self.eval_call(callee, arguments, ctx).await,
                Node::Binary { operator, left, right } => {
                    let left = self.eval_node(left, ctx).await?;
                    let right = self.eval_node(right, ctx).await?;
                    apply_binary(*operator, &left, &right)
                }
                Node::Logical { operator, left, right } => {
                    let left = self.eval_node(left, ctx).await?;
                    match operator {
                        LogicalOperator::And if !left.is_truthy() => Ok(left),
                        LogicalOperator::Or if left.is_truthy() => Ok(left),
                        _ => self.eval_node(right, ctx).await,
                    }
                }
                Node::Unary { operator, argument } => {
                    let value = self.eval_node(argument, ctx).await?;
                    match operator {
                        UnaryOperator::Not => Ok(Value::Bool(!value.is_truthy())),
                        UnaryOperator::Minus => Ok(Value::Number(-value.to_number())),
                        UnaryOperator::Plus => Ok(Value::Number(value.to_number())),
                        UnaryOperator::Typeof | UnaryOperator::Void | UnaryOperator::Delete => {
                            Err(self.disallowed(&format!("'{}' operator", operator), ctx))
                        }
                    }
                }
                Node::Conditional {
                    test,
                    consequent,
                    alternate,
                } => {
                    if self.eval_node(test, ctx).await?.is_truthy() {
                        self.eval_node(consequent, ctx).await
                    } else {
                        self.eval_node(alternate, ctx).await
                    }
                }
                Node::Array(items) => {
                    let mut values = Vec::with_capacity(items.len());
                    for item in items {
                        values.push(self.eval_node(item, ctx).await?);
                    }
                    Ok(Value::Array(values))
                }
                Node::Object(properties) => {
                    let mut map = BTreeMap::new();
                    for property in properties {
                        let PropertyKey::Static(key) = &property.key else {
                            return Err(self.disallowed("computed object key", ctx));
                        };
                        let value = self.eval_node(&property.value, ctx).await?;
                        map.insert(key.clone(), value);
                    }
                    Ok(Value::Object(map))
                }
                Node::Function { .. }
                | Node::Class { .. }
                | Node::Assignment { .. }
                | Node::Update { .. }
                | Node::Loop { .. }
                | Node::New { .. }
                | Node::Template { .. }
                | Node::Sequence(_)
                | Node::This
                | Node::Statement { .. } => Err(self.disallowed(node.tag(), ctx)),
            }
        }
        .boxed()
    }

    async fn eval_call(
        &self,
        callee: &Node,
        arguments: &[Node],
        ctx: &ExecutionContext,
    ) -> Result<Value, EvalError> {
        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            args.push(self.eval_node(argument, ctx).await?);
        }
        let first = args.first().cloned().unwrap_or_default();

        let name = match callee {
            Node::Identifier(name) => name.as_str(),
            Node::Member {
                object,
                property: MemberProperty::Named(name),
            } if matches!(object.as_ref(), Node::Identifier(ns) if ns == "Math") => {
                return self.eval_math(name, &args, ctx);
            }
            other => return Err(self.disallowed(&format!("call through {}", other.tag()), ctx)),
        };

        match name {
            "get" => {
                if first.is_nullish() {
                    return Ok(Value::Undefined);
                }
                let key = first.to_display_string();
                Ok(Value::from(ctx.variables.get(&key).await?))
            }
            "isEmpty" => Ok(Value::Bool(is_empty(&first))),
            "notEmpty" => Ok(is_not_empty(&first)),
            "matches" => {
                let text = first.to_display_string();
                let pattern = args.get(1).cloned().unwrap_or_default().to_display_string();
                if let Err(e) = self.regex.validate(&pattern) {
                    ctx.logger
                        .warn(&format!("matches(): pattern {:?} refused: {}", pattern, e));
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.regex.safe_test(&pattern, &text).await))
            }
            other => Err(self.disallowed(&format!("call to '{}'", other), ctx)),
        }
    }

    fn eval_math(
        &self,
        name: &str,
        args: &[Value],
        ctx: &ExecutionContext,
    ) -> Result<Value, EvalError> {
        let numbers: Vec<f64> = args.iter().map(Value::to_number).collect();
        let first = numbers.first().copied().unwrap_or(f64::NAN);

        let result = match name {
            "max" => numbers.iter().try_fold(f64::NEG_INFINITY, |acc, &n| {
                if n.is_nan() {
                    None
                } else {
                    Some(acc.max(n))
                }
            }),
            "min" => numbers.iter().try_fold(f64::INFINITY, |acc, &n| {
                if n.is_nan() {
                    None
                } else {
                    Some(acc.min(n))
                }
            }),
            "abs" => Some(first.abs()),
            // Halves round towards positive infinity
            "round" => {
                let floor = first.floor();
                Some(if first - floor >= 0.5 { floor + 1.0 } else { floor })
            }
            "floor" => Some(first.floor()),
            "ceil" => Some(first.ceil()),
            other => return Err(self.disallowed(&format!("call to 'Math.{}'", other), ctx)),
        };

        Ok(Value::Number(result.unwrap_or(f64::NAN)))
    }

    /// A node the validator should have rejected reached the evaluator
    fn disallowed(&self, construct: &str, ctx: &ExecutionContext) -> EvalError {
        ctx.logger
            .error(&format!("Disallowed construct reached evaluation: {}", construct));
        EvalError::evaluation(format!("{} cannot be evaluated", construct))
    }
}

impl Default for ConditionEvaluator {
    fn default() -> Self {
        Self::new(EvaluatorConfig::default())
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::String(s) => Value::String(s.clone()),
        Literal::Number(n) => Value::Number(*n),
        Literal::Boolean(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
        Literal::Undefined => Value::Undefined,
    }
}

fn apply_binary(operator: BinaryOperator, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let result = match operator {
        BinaryOperator::LooseEq => Value::Bool(loose_equals(left, right)),
        BinaryOperator::LooseNotEq => Value::Bool(!loose_equals(left, right)),
        BinaryOperator::StrictEq => Value::Bool(strict_equals(left, right)),
        BinaryOperator::StrictNotEq => Value::Bool(!strict_equals(left, right)),
        BinaryOperator::Lt | BinaryOperator::Gt | BinaryOperator::Lte | BinaryOperator::Gte => {
            require_scalar(operator, left, right)?;
            let ordering = compare(left, right);
            Value::Bool(match operator {
                BinaryOperator::Lt => ordering == Some(Ordering::Less),
                BinaryOperator::Gt => ordering == Some(Ordering::Greater),
                BinaryOperator::Lte => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                _ => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            })
        }
        BinaryOperator::Add => {
            require_scalar(operator, left, right)?;
            if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
                Value::String(left.to_display_string() + &right.to_display_string())
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOperator::Sub | BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod => {
            require_scalar(operator, left, right)?;
            let (a, b) = (left.to_number(), right.to_number());
            Value::Number(match operator {
                BinaryOperator::Sub => a - b,
                BinaryOperator::Mul => a * b,
                BinaryOperator::Div => a / b,
                _ => a % b,
            })
        }
    };
    Ok(result)
}

fn require_scalar(operator: BinaryOperator, left: &Value, right: &Value) -> Result<(), EvalError> {
    for value in [left, right] {
        if value.is_composite() {
            return Err(EvalError::evaluation(format!(
                "operator '{}' cannot be applied to {} ({} {} {})",
                operator,
                value.type_name(),
                left.type_name(),
                operator,
                right.type_name()
            )));
        }
    }
    Ok(())
}

/// Contents of a quoted string without escapes or inner quotes
fn plain_string(text: &str) -> Option<&str> {
    let quote = text.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let inner = text.strip_prefix(quote)?.strip_suffix(quote)?;
    if inner.contains(quote) || inner.contains('\\') {
        return None;
    }
    Some(inner)
}

/// `name` or `a.b.c` made of plain, non-reserved identifiers
fn is_plain_path(text: &str) -> bool {
    use super::lexer::{is_ident_part, is_ident_start};

    text.split('.').enumerate().all(|(i, segment)| {
        let mut chars = segment.chars();
        let valid = chars.next().is_some_and(is_ident_start) && chars.all(is_ident_part);
        valid
            && check_property_name(segment).is_ok()
            && (i > 0 || !is_reserved_word(segment))
            && !matches!(segment, "true" | "false" | "null" | "undefined")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{ErrorKind, PatternError};
    use crate::state::MemoryVariables;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    fn context(vars: serde_json::Value) -> ExecutionContext {
        ExecutionContext::new(
            "exec-1",
            "project-1",
            "workflow-1",
            1,
            Arc::new(MemoryVariables::from_json(vars)),
        )
    }

    async fn eval(source: &str, vars: serde_json::Value) -> Result<Value, EvalError> {
        ConditionEvaluator::default()
            .evaluate(source, &context(vars))
            .await
    }

    #[tokio::test]
    async fn test_comparisons() {
        let vars = json!({"intent": "search", "balance": 150, "name": "Ann"});
        assert_eq!(eval("intent === 'search'", vars.clone()).await.unwrap(), Value::Bool(true));
        assert_eq!(eval("balance > 100", vars.clone()).await.unwrap(), Value::Bool(true));
        assert_eq!(eval("balance <= 100", vars.clone()).await.unwrap(), Value::Bool(false));
        assert_eq!(eval("name < 'Bob'", vars.clone()).await.unwrap(), Value::Bool(true));
        assert_eq!(eval("balance !== '150'", vars).await.unwrap(), Value::Bool(true));
    }

    #[tokio::test]
    async fn test_loose_equality_only_merges_nullish() {
        let vars = json!({"empty": null, "count": 0});
        assert_eq!(eval("empty == undefined", vars.clone()).await.unwrap(), Value::Bool(true));
        assert_eq!(eval("missing == null", vars.clone()).await.unwrap(), Value::Bool(true));
        assert_eq!(eval("empty === undefined", vars.clone()).await.unwrap(), Value::Bool(false));
        assert_eq!(eval("count == '0'", vars.clone()).await.unwrap(), Value::Bool(false));
        assert_eq!(eval("count != null", vars).await.unwrap(), Value::Bool(true));
    }

    #[tokio::test]
    async fn test_logical_operators_return_operands() {
        let vars = json!({"name": "Ann", "empty": ""});
        assert_eq!(eval("empty || name", vars.clone()).await.unwrap(), Value::from("Ann"));
        assert_eq!(eval("empty && name", vars.clone()).await.unwrap(), Value::from(""));
        assert_eq!(eval("name && 42", vars).await.unwrap(), Value::Number(42.0));
    }

    #[tokio::test]
    async fn test_ternary_and_unary() {
        let vars = json!({"vip": true, "score": "7"});
        assert_eq!(
            eval("vip ? 'gold' : 'basic'", vars.clone()).await.unwrap(),
            Value::from("gold")
        );
        assert_eq!(eval("!vip", vars.clone()).await.unwrap(), Value::Bool(false));
        assert_eq!(eval("-score", vars.clone()).await.unwrap(), Value::Number(-7.0));
        assert_eq!(eval("+score + 1", vars).await.unwrap(), Value::Number(8.0));
    }

    #[tokio::test]
    async fn test_arithmetic_and_concatenation() {
        let vars = json!({"a": 7, "b": 2, "name": "Ann"});
        assert_eq!(eval("a + b * 3", vars.clone()).await.unwrap(), Value::Number(13.0));
        assert_eq!(eval("a % b", vars.clone()).await.unwrap(), Value::Number(1.0));
        assert_eq!(eval("a / b", vars.clone()).await.unwrap(), Value::Number(3.5));
        assert_eq!(eval("'Hi ' + name", vars.clone()).await.unwrap(), Value::from("Hi Ann"));
        assert_eq!(eval("a + '1'", vars).await.unwrap(), Value::from("71"));
    }

    #[tokio::test]
    async fn test_composite_operands_are_errors() {
        let vars = json!({"items": [1, 2], "user": {"a": 1}});
        for source in ["items > 1", "user + 1", "items * 2", "1 <= user"] {
            let err = eval(source, vars.clone()).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Evaluation, "{}", source);
        }
        // Equality on composites is fine
        assert_eq!(eval("items === items", vars).await.unwrap(), Value::Bool(true));
    }

    #[tokio::test]
    async fn test_member_access() {
        let vars = json!({
            "user": {"profile": {"name": "Ann"}, "tags": ["a", "b"]},
            "items": [{"price": 10}, {"price": 20}],
            "flat.key": "flat"
        });
        assert_eq!(eval("user.profile.name", vars.clone()).await.unwrap(), Value::from("Ann"));
        assert_eq!(eval("user.tags.length", vars.clone()).await.unwrap(), Value::Number(2.0));
        assert_eq!(
            eval("user.profile.name.length", vars.clone())
                .await
                .unwrap(),
            Value::Number(3.0)
        );
        assert_eq!(eval("items[1].price", vars.clone()).await.unwrap(), Value::Number(20.0));
        assert_eq!(eval("user['profile'].name", vars.clone()).await.unwrap(), Value::from("Ann"));
        assert_eq!(eval("user.missing.deeper", vars.clone()).await.unwrap(), Value::Undefined);
        assert_eq!(eval("nobody.name", vars.clone()).await.unwrap(), Value::Undefined);
        assert_eq!(eval("flat.key", vars).await.unwrap(), Value::from("flat"));
    }

    #[tokio::test]
    async fn test_builtins() {
        let vars = json!({"balance": 50, "phone": "  ", "email": "ann@example.com"});
        assert_eq!(eval("get('balance')", vars.clone()).await.unwrap(), Value::Number(50.0));
        assert_eq!(eval("get('nope')", vars.clone()).await.unwrap(), Value::Undefined);
        assert_eq!(eval("isEmpty(phone)", vars.clone()).await.unwrap(), Value::Bool(true));
        assert_eq!(eval("isEmpty(balance)", vars.clone()).await.unwrap(), Value::Bool(false));
        assert_eq!(
            eval("notEmpty(email)", vars.clone()).await.unwrap(),
            Value::from("ann@example.com")
        );
        assert_eq!(eval("notEmpty(phone)", vars.clone()).await.unwrap(), Value::Bool(false));
        assert_eq!(
            eval("matches(email, '^[a-z]+@example\\\\.com$')", vars.clone())
                .await
                .unwrap(),
            Value::Bool(true)
        );
        assert_eq!(eval("matches(email, '(a+)+$')", vars).await.unwrap(), Value::Bool(false));
    }

    #[tokio::test]
    async fn test_math() {
        let vars = json!({"a": 3, "b": "8"});
        assert_eq!(eval("Math.max(a, b, 5)", vars.clone()).await.unwrap(), Value::Number(8.0));
        assert_eq!(eval("Math.min(a, b)", vars.clone()).await.unwrap(), Value::Number(3.0));
        assert_eq!(
            eval("Math.max()", vars.clone()).await.unwrap(),
            Value::Number(f64::NEG_INFINITY)
        );
        assert_eq!(eval("Math.abs(-4.5)", vars.clone()).await.unwrap(), Value::Number(4.5));
        assert_eq!(eval("Math.round(2.5)", vars.clone()).await.unwrap(), Value::Number(3.0));
        assert_eq!(eval("Math.round(-2.5)", vars.clone()).await.unwrap(), Value::Number(-2.0));
        assert_eq!(
            eval("Math.round(0.49999999999999994)", vars.clone())
                .await
                .unwrap(),
            Value::Number(0.0)
        );
        assert_eq!(eval("Math.round(-0.6)", vars.clone()).await.unwrap(), Value::Number(-1.0));
        assert_eq!(eval("Math.floor(a / 2)", vars.clone()).await.unwrap(), Value::Number(1.0));
        assert_eq!(eval("Math.ceil(a / 2)", vars.clone()).await.unwrap(), Value::Number(2.0));
        match eval("Math.max(a, 'x')", vars).await.unwrap() {
            Value::Number(n) => assert!(n.is_nan()),
            other => panic!("Expected NaN, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_array_and_object_literals() {
        let vars = json!({"name": "Ann"});
        assert_eq!(
            eval("[1, name]", vars.clone()).await.unwrap(),
            Value::from(json!([1, "Ann"]))
        );
        assert_eq!(
            eval("{ who: name, n: 1 }", vars).await.unwrap(),
            Value::from(json!({"who": "Ann", "n": 1}))
        );
    }

    #[tokio::test]
    async fn test_rejections_happen_before_evaluation() {
        let err = eval("function test() {}", json!({})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Security);
        let err = eval("class Test {}", json!({})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Security);
        let err = eval(&"a".repeat(1001), json!({})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LengthExceeded);
        let err = eval("a >", json!({})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[tokio::test]
    async fn test_disallowed_node_reaching_walker() {
        let evaluator = ConditionEvaluator::default();
        let ctx = context(json!({}));
        let node = Node::This;
        let err = evaluator.eval_node(&node, &ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Evaluation);
    }

    #[tokio::test]
    async fn test_evaluate_condition_routes_plain_values() {
        let evaluator = ConditionEvaluator::default();
        let ctx = context(json!({"flag": true, "user": {"active": false}, "zero": 0}));

        assert!(evaluator.evaluate_condition("flag", &ctx).await.unwrap());
        assert!(!evaluator
            .evaluate_condition("user.active", &ctx)
            .await
            .unwrap());
        assert!(!evaluator.evaluate_condition("zero", &ctx).await.unwrap());
        assert!(!evaluator.evaluate_condition("missing", &ctx).await.unwrap());
        assert!(evaluator.evaluate_condition("'text'", &ctx).await.unwrap());
        assert!(!evaluator.evaluate_condition("0", &ctx).await.unwrap());
        assert!(evaluator
            .evaluate_condition("flag && !user.active", &ctx)
            .await
            .unwrap());

        let err = evaluator
            .evaluate_condition("this", &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Security);
        let err = evaluator
            .evaluate_condition("user.constructor", &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Security);
    }

    #[tokio::test]
    async fn test_evaluate_structured() {
        let evaluator = ConditionEvaluator::default();
        let ctx = context(json!({"user": {"balance": 150, "city": "Berlin"}}));

        let condition = Condition::new("user.balance", "greater".parse().unwrap(), json!(100));
        assert_eq!(
            evaluator
                .evaluate_structured(&condition, &ctx)
                .await
                .unwrap(),
            Value::Bool(true)
        );

        let condition = Condition::new("user.city", "contains".parse().unwrap(), json!("BER"));
        assert_eq!(
            evaluator
                .evaluate_structured(&condition, &ctx)
                .await
                .unwrap(),
            Value::Bool(true)
        );
        let condition = condition.case_sensitive(true);
        assert_eq!(
            evaluator
                .evaluate_structured(&condition, &ctx)
                .await
                .unwrap(),
            Value::Bool(false)
        );

        let condition = Condition::new("user.__proto__", "is_empty".parse().unwrap(), json!(null));
        assert!(evaluator
            .evaluate_structured(&condition, &ctx)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_compile_uses_cache() {
        let evaluator = ConditionEvaluator::default();
        let first = evaluator.compile("a > 1", 3).await.unwrap();
        let second = evaluator.compile("a > 1", 3).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(evaluator.cache().unwrap().len().await, 1);

        // Rejected expressions are never cached
        assert!(evaluator.compile("a = 1", 3).await.is_err());
        assert_eq!(evaluator.cache().unwrap().len().await, 1);

        let uncached = ConditionEvaluator::new(EvaluatorConfig {
            cache_capacity: 0,
            ..EvaluatorConfig::default()
        });
        assert!(uncached.cache().is_none());
        assert!(uncached.compile("a > 1", 3).await.is_ok());
    }

    #[tokio::test]
    async fn test_configured_length_limit() {
        let evaluator = ConditionEvaluator::new(EvaluatorConfig {
            max_expression_length: 10,
            ..EvaluatorConfig::default()
        });
        let ctx = context(json!({}));
        let err = evaluator.evaluate("aaaaaaaaaaa", &ctx).await.unwrap_err();
        assert!(matches!(err, EvalError::LengthExceeded { length: 11, max: 10 }));
        let err = evaluator
            .evaluate_condition("aaaaaaaaaaa", &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, EvalError::LengthExceeded { .. }));
    }

    #[tokio::test]
    async fn test_long_operator_chains_are_rejected() {
        let ctx = context(json!({"a": true}));
        let evaluator = ConditionEvaluator::default();

        let err = evaluator
            .evaluate(&format!("{}1", "1+".repeat(499)), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);

        let err = evaluator
            .evaluate_condition(&format!("{}a", "a&&".repeat(332)), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);

        let value = evaluator
            .evaluate(&format!("{}1", "1+".repeat(40)), &ctx)
            .await
            .unwrap();
        assert_eq!(value, Value::Number(41.0));
    }

    /// Regex service that refuses everything and counts calls
    struct RefusingRegex {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RegexService for RefusingRegex {
        fn validate(&self, _pattern: &str) -> Result<(), PatternError> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            Err(PatternError::Invalid("refused".to_string()))
        }

        async fn safe_test(&self, _pattern: &str, _input: &str) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_injected_regex_service() {
        let regex = Arc::new(RefusingRegex {
            calls: AtomicUsize::new(0),
        });
        let evaluator =
            ConditionEvaluator::with_regex_service(EvaluatorConfig::default(), regex.clone());
        let ctx = context(json!({"text": "abc"}));

        let value = evaluator
            .evaluate("matches(text, 'a')", &ctx)
            .await
            .unwrap();
        assert_eq!(value, Value::Bool(false));
        assert_eq!(regex.calls.load(AtomicOrdering::SeqCst), 1);
    }
}
