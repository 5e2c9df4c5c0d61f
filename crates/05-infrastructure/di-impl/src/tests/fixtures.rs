//! 测试用的服务类型与类型目录

use di_abstractions::{ParameterSpec, Service, TypeCatalog, TypeDescriptor};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub trait Logger: Send + Sync {
    fn name(&self) -> &'static str;
}

pub struct FileLogger;

impl Logger for FileLogger {
    fn name(&self) -> &'static str {
        "file"
    }
}

pub struct NullLogger;

impl Logger for NullLogger {
    fn name(&self) -> &'static str {
        "null"
    }
}

pub struct Mailer {
    pub logger: Arc<dyn Logger>,
    pub sender: Mutex<String>,
}

pub struct Left {
    pub right: Service<Right>,
}

pub struct Right {
    pub left: Service<Left>,
}

pub struct Heavy;

pub struct Server {
    pub port: i64,
    pub debug: bool,
}

pub fn logger_descriptors() -> Vec<TypeDescriptor> {
    vec![
        TypeDescriptor::interface("app::Logger"),
        TypeDescriptor::concrete("app::FileLogger")
            .constructor(Vec::<ParameterSpec>::new(), |_| Ok(FileLogger))
            .implements("app::Logger", |it: Arc<FileLogger>| it as Arc<dyn Logger>),
        TypeDescriptor::concrete("app::NullLogger")
            .constructor(Vec::<ParameterSpec>::new(), |_| Ok(NullLogger))
            .implements("app::Logger", |it: Arc<NullLogger>| it as Arc<dyn Logger>),
    ]
}

pub fn mailer_descriptor() -> TypeDescriptor {
    TypeDescriptor::concrete("app::Mailer")
        .constructor([ParameterSpec::service("logger", "app::Logger")], |args| {
            Ok(Mailer {
                logger: args.get::<dyn Logger>(0)?,
                sender: Mutex::new(String::from("noreply@example.com")),
            })
        })
        .method("set_sender", [ParameterSpec::string("sender")], |this: &Mailer, args| {
            *this.sender.lock() = args.string(0)?;
            Ok(())
        })
}

pub fn cycle_descriptors() -> Vec<TypeDescriptor> {
    vec![
        TypeDescriptor::concrete("app::Left")
            .constructor([ParameterSpec::service("right", "app::Right")], |args| {
                Ok(Left {
                    right: args.service(0)?,
                })
            }),
        TypeDescriptor::concrete("app::Right")
            .constructor([ParameterSpec::service("left", "app::Left")], |args| {
                Ok(Right {
                    left: args.service(0)?,
                })
            }),
    ]
}

/// 构造次数由外部计数器记录
pub fn heavy_descriptor(constructed: Arc<AtomicUsize>) -> TypeDescriptor {
    TypeDescriptor::concrete("app::Heavy").constructor(Vec::<ParameterSpec>::new(), move |_| {
        constructed.fetch_add(1, Ordering::SeqCst);
        Ok(Heavy)
    })
}

pub fn server_descriptor() -> TypeDescriptor {
    TypeDescriptor::concrete("app::Server").constructor(
        [
            ParameterSpec::int("port").param("PORT"),
            ParameterSpec::bool("debug").param("APP_DEBUG").with_default(false),
        ],
        |args| {
            Ok(Server {
                port: args.int(0)?,
                debug: args.bool(1)?,
            })
        },
    )
}

pub fn catalog() -> TypeCatalog {
    let mut catalog = TypeCatalog::new();
    for descriptor in logger_descriptors()
        .into_iter()
        .chain(cycle_descriptors())
        .chain([mailer_descriptor(), server_descriptor()])
    {
        catalog.register(descriptor);
    }
    catalog
}
