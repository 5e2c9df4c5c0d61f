//! 应用构建器

use crate::application::Application;
use config_abstractions::ParameterSource;
use config_impl::{EnvResolver, JsonParameterSource, TomlParameterSource};
use di_abstractions::{ComponentScanner, TypeCatalog, TypeDescriptor};
use di_impl::{ContainerBuilder, ManifestCompiler};
use infrastructure_common::InfrastructureError;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type Configurator = Box<dyn FnOnce(&mut ContainerBuilder)>;

/// 应用构建器
///
/// 使用建造者模式组装参数来源、扫描器与容器定义，`build` 时按固定顺序执行：
/// 日志初始化、参数来源、容器配置回调、组件扫描、清单编译、容器冻结。
pub struct ApplicationBuilder {
    /// 项目目录，`.env` 文件从这里读取
    project_dir: Option<PathBuf>,
    /// 额外的环境变量来源
    parameter_sources: Vec<Box<dyn ParameterSource>>,
    /// 从参数文件读取的参数
    parameters: Vec<(String, Value)>,
    /// 类型目录
    catalog: TypeCatalog,
    /// 自定义扫描器及其扫描目标
    component_scanners: Vec<(Box<dyn ComponentScanner>, String)>,
    /// 类型目录扫描目标
    catalog_targets: Vec<String>,
    /// 容器配置回调
    configurators: Vec<Configurator>,
    /// 默认延迟加载
    default_lazy: bool,
    /// 清单输出路径
    manifest_output: Option<PathBuf>,
    /// 是否启用日志初始化
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
}

impl ApplicationBuilder {
    /// 创建新的应用构建器
    pub fn new() -> Self {
        Self {
            project_dir: None,
            parameter_sources: Vec::new(),
            parameters: Vec::new(),
            catalog: TypeCatalog::new(),
            component_scanners: Vec::new(),
            catalog_targets: Vec::new(),
            configurators: Vec::new(),
            default_lazy: true,
            manifest_output: None,
            logging_enabled: false, // 默认不启用日志初始化
            logging_config: LoggingConfig::default(),
        }
    }

    /// 设置项目目录，读取其中的 `.env` 与 `.env.local`
    pub fn project_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        info!("项目目录: {}", path.display());
        self.project_dir = Some(path);
        self
    }

    /// 添加 TOML 参数文件，嵌套键以 `.` 连接
    pub fn add_parameters_toml<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = path.as_ref();
        ensure_exists(path)?;

        info!("添加 TOML 参数文件: {}", path.display());
        let source = TomlParameterSource::new(path)?;
        self.extend_parameters(source.values());
        Ok(self)
    }

    /// 添加 JSON 参数文件，嵌套键以 `.` 连接
    pub fn add_parameters_json<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = path.as_ref();
        ensure_exists(path)?;

        info!("添加 JSON 参数文件: {}", path.display());
        let source = JsonParameterSource::new(path)?;
        self.extend_parameters(source.values());
        Ok(self)
    }

    /// 设置单个参数
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_parameter(name.into(), value.into());
        self
    }

    /// 添加环境变量来源
    pub fn add_parameter_source<T: ParameterSource + 'static>(mut self, source: T) -> Self {
        info!("添加参数来源: {}", source.name());
        self.parameter_sources.push(Box::new(source));
        self
    }

    /// 使用已有的类型目录
    pub fn with_catalog(mut self, catalog: TypeCatalog) -> Self {
        debug!("使用类型目录: {} 个类型", catalog.len());
        self.catalog = catalog;
        self
    }

    /// 注册类型描述符
    pub fn register_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.catalog.register(descriptor);
        self
    }

    /// 添加组件扫描器
    pub fn add_component_scanner<T: ComponentScanner + 'static>(
        mut self,
        scanner: T,
        target: impl Into<String>,
    ) -> Self {
        debug!("添加组件扫描器: {}", scanner.name());
        self.component_scanners.push((Box::new(scanner), target.into()));
        self
    }

    /// 扫描类型目录中指定模块下的类型
    pub fn scan_catalog(mut self, target: impl Into<String>) -> Self {
        self.catalog_targets.push(target.into());
        self
    }

    /// 配置容器构建器，回调在组件扫描之前执行
    pub fn configure(mut self, configure: impl FnOnce(&mut ContainerBuilder) + 'static) -> Self {
        self.configurators.push(Box::new(configure));
        self
    }

    /// 未显式声明延迟加载的服务使用的默认值
    pub fn default_lazy(mut self, lazy: bool) -> Self {
        self.default_lazy = lazy;
        self
    }

    /// 构建时把容器清单写到指定路径
    pub fn manifest_output<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.manifest_output = Some(path.as_ref().to_path_buf());
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true; // 启用日志初始化
        self
    }

    /// 构建应用
    pub fn build(self) -> Result<Application, InfrastructureError> {
        // 只有在明确配置了日志时才初始化日志
        if self.logging_enabled {
            self.logging_config.init()?;
        }

        info!("开始构建应用");

        let mut resolver = match &self.project_dir {
            Some(dir) => EnvResolver::from_project_dir(dir),
            None => EnvResolver::from_process_env(),
        };
        for source in self.parameter_sources {
            resolver.add_source(source);
        }
        debug!("参数来源: {:?}", resolver.source_names());

        let mut builder = ContainerBuilder::with_catalog(self.catalog);
        builder
            .parameter_resolver(Arc::new(resolver))
            .default_lazy(self.default_lazy);
        for (name, value) in self.parameters {
            builder.parameter(name, value);
        }

        for configure in self.configurators {
            configure(&mut builder);
        }

        for (scanner, target) in &self.component_scanners {
            builder.scan(scanner.as_ref(), target)?;
        }
        for target in &self.catalog_targets {
            builder.scan_catalog(target)?;
        }

        let manifest = match &self.manifest_output {
            Some(output) => {
                let mut compiler = ManifestCompiler::new(output);
                builder.compile(&mut compiler)?;
                compiler.manifest().cloned()
            }
            None => None,
        };

        let container = builder.build()?;

        info!("应用构建完成: {} 个服务", container.definitions().len());
        Ok(Application::new(container, manifest))
    }

    fn extend_parameters(&mut self, values: &HashMap<String, Value>) {
        let mut keys: Vec<&String> = values.keys().collect();
        keys.sort();
        for key in keys {
            self.set_parameter(key.clone(), values[key].clone());
        }
    }

    fn set_parameter(&mut self, name: String, value: Value) {
        match self.parameters.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.parameters.push((name, value)),
        }
    }
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_exists(path: &Path) -> Result<(), InfrastructureError> {
    if path.exists() {
        return Ok(());
    }
    Err(InfrastructureError::BootstrapFailed {
        message: format!("参数文件不存在: {}", path.display()),
    })
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 过滤指令，如 `di_impl=debug`；`RUST_LOG` 优先
    pub filter: Option<String>,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            filter: None,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            filter: None,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            filter: None,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 设置过滤指令
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// 生效的过滤指令
    pub fn directive(&self) -> String {
        self.filter
            .clone()
            .unwrap_or_else(|| self.level.to_string().to_lowercase())
    }

    /// 安装全局订阅者
    pub fn init(&self) -> Result<(), InfrastructureError> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.directive()))
            .map_err(|e| InfrastructureError::BootstrapFailed {
                message: format!("日志过滤指令无效: {}", e),
            })?;

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_file)
            .with_line_number(self.show_line_number);

        if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}
