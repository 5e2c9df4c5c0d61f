//! 自动装配
//!
//! 按类型描述符中的参数表逐个解析构造函数和 setter 的参数，
//! 同时维护每个线程的"正在解析"栈作为运行期循环依赖的兜底检测。

use config_impl::is_truthy;
use dashmap::DashMap;
use di_abstractions::{
    Argument, Arguments, MethodSpec, Object, ParameterSpec, ParameterType, PrimitiveType,
    ServiceContainer, TypeDescriptor,
};
use infrastructure_common::{AutowireError, CircularDependencyError, ContainerError, ServiceId};
use serde_json::Value;
use std::thread::{self, ThreadId};
use tracing::debug;

/// 自动装配器
#[derive(Debug, Default)]
pub struct Autowirer {
    resolving: DashMap<ThreadId, Vec<ServiceId>>,
}

/// 解析栈守卫，离开作用域时弹出栈顶
pub struct ResolvingGuard<'a> {
    autowirer: &'a Autowirer,
    thread: ThreadId,
}

impl Drop for ResolvingGuard<'_> {
    fn drop(&mut self) {
        let empty = match self.autowirer.resolving.get_mut(&self.thread) {
            Some(mut stack) => {
                stack.pop();
                stack.is_empty()
            }
            None => false,
        };
        if empty {
            self.autowirer
                .resolving
                .remove_if(&self.thread, |_, stack| stack.is_empty());
        }
    }
}

impl Autowirer {
    /// 创建自动装配器
    pub fn new() -> Self {
        Self::default()
    }

    /// 将类型压入当前线程的解析栈，类型已在栈中时报告循环依赖
    pub fn enter(&self, type_name: &ServiceId) -> Result<ResolvingGuard<'_>, CircularDependencyError> {
        let thread = thread::current().id();
        let mut stack = self.resolving.entry(thread).or_default();

        if stack.contains(type_name) {
            let mut chain = stack.clone();
            chain.push(type_name.clone());
            return Err(CircularDependencyError::runtime(chain));
        }

        stack.push(type_name.clone());
        Ok(ResolvingGuard {
            autowirer: self,
            thread,
        })
    }

    /// 当前线程的解析栈
    pub fn resolving_stack(&self) -> Vec<ServiceId> {
        self.resolving
            .get(&thread::current().id())
            .map(|stack| stack.clone())
            .unwrap_or_default()
    }

    /// 通过构造函数创建实例
    pub fn instantiate(
        &self,
        descriptor: &TypeDescriptor,
        container: &dyn ServiceContainer,
    ) -> Result<Object, ContainerError> {
        let constructor = descriptor
            .constructor_spec()
            .filter(|_| descriptor.is_instantiable())
            .ok_or_else(|| AutowireError::NotInstantiable {
                type_name: descriptor.id().clone(),
            })?;

        let owner = format!("{}::new", descriptor.id());
        let mut arguments = Arguments::new(owner.as_str());
        for parameter in constructor.parameters() {
            let argument = self.resolve_parameter(parameter, &owner, container)?;
            arguments.push(parameter.name.as_str(), argument);
        }

        debug!("自动装配 {}（{} 个参数）", descriptor.id(), arguments.len());
        constructor.build(&arguments)
    }

    /// 解析 setter 参数
    ///
    /// 预先提供的字符串参数若是容器中的服务标识符，则替换为该服务；
    /// 其他值原样传入；缺省的尾部参数按参数表自动装配。
    pub fn resolve_method_arguments(
        &self,
        owner: &ServiceId,
        method: &MethodSpec,
        provided: &[Value],
        container: &dyn ServiceContainer,
    ) -> Result<Arguments, ContainerError> {
        let owner = format!("{}::{}", owner, method.name());
        let mut arguments = Arguments::new(owner.as_str());

        for (index, parameter) in method.parameters().iter().enumerate() {
            let argument = match provided.get(index) {
                Some(Value::String(id)) if container.has(id) => Argument::Service(container.get(id)?),
                Some(value) => Argument::Value(value.clone()),
                None => self.resolve_parameter(parameter, &owner, container)?,
            };
            arguments.push(parameter.name.as_str(), argument);
        }

        Ok(arguments)
    }

    /// 按优先级解析单个参数：显式注入、参数表、类型、联合类型、默认值、空值
    pub fn resolve_parameter(
        &self,
        parameter: &ParameterSpec,
        owner: &str,
        container: &dyn ServiceContainer,
    ) -> Result<Argument, ContainerError> {
        if let Some(id) = &parameter.inject {
            return Ok(Argument::Service(container.get(id.as_str())?));
        }

        if let Some(key) = &parameter.param {
            return match container.get_parameter(key).filter(|value| !value.is_null()) {
                Some(value) => Ok(Argument::Value(cast_parameter_value(value, parameter))),
                None => match &parameter.default {
                    Some(default) => Ok(Argument::Value(default.clone())),
                    None => Err(AutowireError::MissingParameter {
                        key: key.clone(),
                        parameter: parameter.name.clone(),
                        owner: owner.to_string(),
                    }
                    .into()),
                },
            };
        }

        match &parameter.ty {
            ParameterType::Service(id) if container.has(id.as_str()) => {
                return Ok(Argument::Service(container.get(id.as_str())?));
            }
            ParameterType::Union(ids) => {
                if let Some(id) = ids.iter().find(|id| container.has(id.as_str())) {
                    return Ok(Argument::Service(container.get(id.as_str())?));
                }
            }
            _ => {}
        }

        if let Some(default) = &parameter.default {
            return Ok(Argument::Value(default.clone()));
        }

        if parameter.nullable {
            return Ok(Argument::Value(Value::Null));
        }

        let declared_type = match &parameter.ty {
            ParameterType::Service(_) | ParameterType::Primitive(_) => parameter.ty.describe(),
            ParameterType::Union(_) | ParameterType::Untyped => None,
        };
        Err(AutowireError::UnresolvableParameter {
            parameter: parameter.name.clone(),
            owner: owner.to_string(),
            declared_type,
        }
        .into())
    }
}

/// 将参数表中的字符串值转换为参数声明的标量类型
///
/// 只有字符串会被转换；转换失败时保留原值，由调用方在取值时报告类型不符。
pub fn cast_parameter_value(value: Value, parameter: &ParameterSpec) -> Value {
    let (Value::String(raw), Some(primitive)) = (&value, parameter.primitive_type()) else {
        return value;
    };

    match primitive {
        PrimitiveType::Int => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or(value),
        PrimitiveType::Float => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(value),
        PrimitiveType::Bool => Value::Bool(is_truthy(raw)),
        PrimitiveType::Array => match serde_json::from_str::<Value>(raw) {
            Ok(decoded @ (Value::Array(_) | Value::Object(_))) => decoded,
            _ => Value::Array(vec![value]),
        },
        PrimitiveType::String => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_abstractions::{Instance, TaggedServices};
    use serde_json::json;
    use std::collections::HashMap;

    /// 只包含固定实例和参数的测试容器
    #[derive(Default)]
    struct FixedContainer {
        services: HashMap<String, Instance>,
        parameters: HashMap<String, Value>,
    }

    impl FixedContainer {
        fn with_service(mut self, id: &str, value: &'static str) -> Self {
            self.services.insert(id.to_string(), Instance::new(id, value));
            self
        }

        fn with_parameter(mut self, name: &str, value: Value) -> Self {
            self.parameters.insert(name.to_string(), value);
            self
        }
    }

    impl ServiceContainer for FixedContainer {
        fn get(&self, id: &str) -> Result<Instance, ContainerError> {
            self.services
                .get(id)
                .cloned()
                .ok_or_else(|| ContainerError::not_found(id))
        }

        fn has(&self, id: &str) -> bool {
            self.services.contains_key(id)
        }

        fn get_tagged(&self, _tag: &str) -> TaggedServices<'_> {
            Box::new(std::iter::empty())
        }

        fn get_parameter(&self, name: &str) -> Option<Value> {
            self.parameters.get(name).cloned()
        }

        fn get_parameters(&self) -> HashMap<String, Value> {
            self.parameters.clone()
        }
    }

    fn service_name(argument: Argument) -> String {
        match argument {
            Argument::Service(instance) => instance.cast::<&'static str>().unwrap().to_string(),
            Argument::Value(value) => panic!("expected a service, got {value}"),
        }
    }

    #[test]
    fn test_inject_wins_over_type() {
        let container = FixedContainer::default()
            .with_service("app::FileLogger", "file")
            .with_service("app::NullLogger", "null");
        let parameter = ParameterSpec::service("logger", "app::FileLogger").inject("app::NullLogger");

        let argument = Autowirer::new()
            .resolve_parameter(&parameter, "app::Service::new", &container)
            .unwrap();
        assert_eq!(service_name(argument), "null");
    }

    #[test]
    fn test_union_takes_first_registered_branch() {
        let container = FixedContainer::default()
            .with_service("app::Memory", "memory")
            .with_service("app::Disk", "disk");
        let parameter = ParameterSpec::union("cache", ["app::Redis", "app::Memory", "app::Disk"]);

        let argument = Autowirer::new()
            .resolve_parameter(&parameter, "app::Service::new", &container)
            .unwrap();
        assert_eq!(service_name(argument), "memory");
    }

    #[test]
    fn test_param_is_cast_to_declared_type() {
        let container = FixedContainer::default()
            .with_parameter("PORT", json!("8080"))
            .with_parameter("DEBUG", json!("on"))
            .with_parameter("HOSTS", json!("[\"a\",\"b\"]"))
            .with_parameter("TAGS", json!("single"));
        let autowirer = Autowirer::new();
        let resolve = |parameter: ParameterSpec| match autowirer
            .resolve_parameter(&parameter, "app::Server::new", &container)
            .unwrap()
        {
            Argument::Value(value) => value,
            Argument::Service(_) => panic!("expected a value"),
        };

        assert_eq!(resolve(ParameterSpec::int("port").param("PORT")), json!(8080));
        assert_eq!(resolve(ParameterSpec::bool("debug").param("DEBUG")), json!(true));
        assert_eq!(resolve(ParameterSpec::array("hosts").param("HOSTS")), json!(["a", "b"]));
        assert_eq!(resolve(ParameterSpec::array("tags").param("TAGS")), json!(["single"]));
        assert_eq!(resolve(ParameterSpec::untyped("raw").param("PORT")), json!("8080"));
        assert_eq!(
            resolve(ParameterSpec::int("missing").param("MISSING").with_default(3)),
            json!(3)
        );
    }

    #[test]
    fn test_missing_param_without_default_names_the_parameter() {
        let error = Autowirer::new()
            .resolve_parameter(
                &ParameterSpec::string("dsn").param("DATABASE_URL"),
                "app::Repository::new",
                &FixedContainer::default(),
            )
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "Parameter \"DATABASE_URL\" is not defined for parameter $dsn in app::Repository::new()"
        );
    }

    #[test]
    fn test_default_then_nullable_then_error() {
        let autowirer = Autowirer::new();
        let container = FixedContainer::default();

        let defaulted = autowirer
            .resolve_parameter(
                &ParameterSpec::service("clock", "app::Clock").with_default("system"),
                "app::Job::new",
                &container,
            )
            .unwrap();
        assert!(matches!(defaulted, Argument::Value(Value::String(_))));

        let nullable = autowirer
            .resolve_parameter(
                &ParameterSpec::service("clock", "app::Clock").nullable(),
                "app::Job::new",
                &container,
            )
            .unwrap();
        assert!(matches!(nullable, Argument::Value(Value::Null)));

        let error = autowirer
            .resolve_parameter(&ParameterSpec::service("clock", "app::Clock"), "app::Job::new", &container)
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Cannot resolve parameter $clock in app::Job::new() (type: app::Clock)"
        );
    }

    #[test]
    fn test_resolving_stack_detects_reentry() {
        let autowirer = Autowirer::new();
        let a = ServiceId::new("app::A");
        let b = ServiceId::new("app::B");

        let _outer = autowirer.enter(&a).unwrap();
        {
            let _inner = autowirer.enter(&b).unwrap();
            let error = autowirer.enter(&a).err().unwrap();
            assert_eq!(error.chain, vec![a.clone(), b.clone(), a.clone()]);
        }
        assert_eq!(autowirer.resolving_stack(), vec![a.clone()]);
    }

    #[test]
    fn test_stack_is_empty_after_guards_drop() {
        let autowirer = Autowirer::new();
        {
            let _guard = autowirer.enter(&ServiceId::new("app::A")).unwrap();
        }
        assert!(autowirer.resolving_stack().is_empty());
        assert!(autowirer.enter(&ServiceId::new("app::A")).is_ok());
    }
}
