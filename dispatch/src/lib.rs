#![deny(warnings)]

//! 单设备、单队列、单在途的调度引擎。
//!
//! 发现计算代理与内存区,装载预编译代码对象并解析入口符号,
//! 把显式参数与隐式几何块编组进参数内存,经环形命令队列
//! 异步提交,阻塞等待完成信号。一次失败即终止,不重试。

mod device;
mod engine;
mod error;
mod kernargs;
mod loader;
mod queue;
mod symbol;
mod wait;

pub use device::{discover, RegionRoles, Topology};
pub use engine::{DispatchConfig, Engine, EngineError};
pub use error::{functions::*, AllocError, AllocErrorKind, InitError, InitErrorKind, LoadError,
    LoadErrorKind, ResolveError, ResolveErrorKind};
pub use kernargs::{marshal, ArgBuffer};
pub use loader::load;
pub use queue::submit;
pub use symbol::{EntryPoint, SymbolResolver};
pub use wait::wait;

pub extern crate dev_virtual_gpu;
