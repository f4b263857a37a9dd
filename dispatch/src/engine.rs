use crate::{
    device::{discover, Topology},
    error::{exhausted, no_region, queue_create_failed, AllocError, InitError, LoadError,
        ResolveError},
    kernargs::{marshal, ArgBuffer},
    loader,
    queue::submit,
    symbol::SymbolResolver,
    wait,
};
use bytemuck::Pod;
use dev_virtual_gpu::{Executable, Queue, RegionAlloc, Runtime, Signal, WaitState};
use log::debug;
use std::{
    collections::{hash_map::Entry, HashMap},
    fmt,
    path::PathBuf,
};

/// 一次调度请求:代码对象文件、入口符号与几何。
#[derive(Clone, Debug)]
pub struct DispatchConfig {
    pub code_file: PathBuf,
    pub symbol: String,
    pub grid: [u32; 3],
    pub workgroup: [u16; 3],
}

/// 各阶段错误的汇总,每个都是终止性的。
#[derive(Clone, Debug)]
pub enum EngineError {
    Init(InitError),
    Load(LoadError),
    Resolve(ResolveError),
    Alloc(AllocError),
}

macro_rules! from_error {
    ($variant:ident $ty:ty) => {
        impl From<$ty> for EngineError {
            #[inline]
            fn from(e: $ty) -> Self {
                Self::$variant(e)
            }
        }
    };
}

from_error!(Init InitError);
from_error!(Load LoadError);
from_error!(Resolve ResolveError);
from_error!(Alloc AllocError);

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Init(e) => write!(f, "{e}"),
            Self::Load(e) => write!(f, "{e}"),
            Self::Resolve(e) => write!(f, "{e}"),
            Self::Alloc(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// 调度引擎。
///
/// 由发现结果显式构造,持有队列与跨调度复用的完成信号;
/// 没有全局状态,一个进程可以有多个实例。
/// 单在途:上一次等待返回之前不得再次提交。
pub struct Engine {
    runtime: Runtime,
    topology: Topology,
    queue: Queue,
    signal: Signal,
    resolver: SymbolResolver,
    programs: HashMap<PathBuf, Executable>,
}

impl Engine {
    /// 发现设备,按代理声明的上限建队列,创建完成信号。
    pub fn new(runtime: &Runtime) -> Result<Self, InitError> {
        let topology = discover(runtime)?;
        let capacity = topology.gpu.queue_max_size();
        let queue = runtime
            .create_queue(&topology.gpu, capacity)
            .map_err(|e| queue_create_failed(format!("capacity {capacity}: {e:?}")))?;
        debug!("queue capacity: {capacity}");
        Ok(Self {
            runtime: runtime.clone(),
            topology,
            queue,
            signal: runtime.create_signal(1),
            resolver: SymbolResolver::new(),
            programs: HashMap::new(),
        })
    }

    #[inline]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    #[inline]
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    #[inline]
    pub fn completion_signal(&self) -> &Signal {
        &self.signal
    }

    /// 从宿主可访问的设备内存区分配载荷缓冲。
    pub fn alloc_local(&self, size: usize) -> Result<RegionAlloc, AllocError> {
        let region = self
            .topology
            .regions
            .local
            .as_ref()
            .ok_or_else(|| no_region("no host accessible device region"))?;
        region
            .alloc(size)
            .map_err(|e| exhausted(format!("local alloc {size} bytes: {e:?}")))
    }

    /// 装载(或复用已装载的程序)、解析、编组并提交一次调度。
    ///
    /// 返回的参数缓冲由调用者持有至等待完成,随析构归还。
    pub fn dispatch<A: Pod>(
        &mut self,
        config: &DispatchConfig,
        args: &A,
    ) -> Result<ArgBuffer, EngineError> {
        let executable = match self.programs.entry(config.code_file.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(loader::load(
                &self.runtime,
                &self.topology,
                &config.code_file,
            )?),
        };
        let entry = self.resolver.resolve(executable, &config.symbol)?;
        let buffer = marshal(&self.topology, &entry, args, config.grid, config.workgroup)?;

        // 复用前重置;单在途由调用方保证
        self.signal.store(1);
        submit(
            &self.queue,
            &entry,
            &buffer,
            config.grid,
            config.workgroup,
            &self.signal,
        );
        Ok(buffer)
    }

    /// 阻塞直至上一次提交完成。
    #[inline]
    pub fn wait(&self) -> i64 {
        wait::wait(&self.signal, WaitState::Blocked)
    }

    /// 提交并同步等待,参数缓冲随返回归还。
    pub fn run<A: Pod>(&mut self, config: &DispatchConfig, args: &A) -> Result<(), EngineError> {
        let buffer = self.dispatch(config, args)?;
        self.wait();
        drop(buffer);
        Ok(())
    }
}
