use crate::{
    code_object::Entry, Agent, CodeObject, DeviceKind, KernelRecord, Runtime, RuntimeCore,
};
use common::{implicit_args_offset, ImplicitArgs};
use std::{collections::HashMap, mem::size_of, sync::Arc};

/// 装载后的设备程序容器。
///
/// 冻结是不可逆的:冻结时入口的内核对象才注册到运行时,
/// 符号查询仅对冻结后的容器开放;析构时注销。
pub struct Executable {
    core: Arc<RuntimeCore>,
    id: u64,
    pending: Vec<Entry>,
    symbols: HashMap<String, SymbolInfo>,
    frozen: bool,
}

/// 符号解析结果:设备可调用句柄与该入口的资源需求。
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SymbolInfo {
    pub kernel_object: u64,
    pub group_segment_size: u32,
    pub kernarg_segment_size: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ExecutableError {
    AlreadyFrozen,
    NotFrozen,
    InvalidAgent,
    SymbolNotFound,
}

impl Executable {
    /// 创建未冻结的空容器。
    pub fn create(runtime: &Runtime) -> Self {
        let core = runtime.core();
        let id = core.next_handle();
        Self {
            core,
            id,
            pending: Vec::new(),
            symbols: HashMap::new(),
            frozen: false,
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// 把代码对象装入容器,面向目标代理。
    pub fn load_code_object(
        &mut self,
        agent: &Agent,
        code_object: &CodeObject,
    ) -> Result<(), ExecutableError> {
        if self.frozen {
            return Err(ExecutableError::AlreadyFrozen);
        }
        if agent.kind() != DeviceKind::Gpu {
            return Err(ExecutableError::InvalidAgent);
        }
        self.pending.extend(code_object.entries.iter().cloned());
        Ok(())
    }

    /// 冻结容器。此后不可再装载,入口可解析、可调度。
    pub fn freeze(&mut self) -> Result<(), ExecutableError> {
        if self.frozen {
            return Err(ExecutableError::AlreadyFrozen);
        }
        for entry in self.pending.drain(..) {
            let kernel_object = self.core.register_kernel(KernelRecord {
                func: entry.func,
                explicit_args_size: entry.explicit_args_size,
            });
            let kernarg_segment_size = (implicit_args_offset(entry.explicit_args_size as usize)
                + size_of::<ImplicitArgs>()) as u32;
            let _ = self.symbols.insert(
                entry.name,
                SymbolInfo {
                    kernel_object,
                    group_segment_size: entry.group_segment_size,
                    kernarg_segment_size,
                },
            );
        }
        self.frozen = true;
        Ok(())
    }

    /// 按名精确匹配查询入口。
    pub fn symbol(&self, name: &str) -> Result<SymbolInfo, ExecutableError> {
        if !self.frozen {
            return Err(ExecutableError::NotFrozen);
        }
        self.symbols
            .get(name)
            .copied()
            .ok_or(ExecutableError::SymbolNotFound)
    }
}

impl Drop for Executable {
    fn drop(&mut self) {
        for info in self.symbols.values() {
            self.core.unregister_kernel(info.kernel_object);
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Executable, ExecutableError};
    use crate::{isa, CodeObjectBuilder, Runtime};
    use common::ImplicitArgs;
    use std::mem::size_of;

    #[test]
    fn test_lifecycle() {
        let rt = Runtime::new();
        let agents = rt.agents();
        let co = crate::CodeObject::deserialize(
            &CodeObjectBuilder::new()
                .entry("add_arrays.kd", isa::ADD_ARRAYS, 24, 0)
                .serialize(),
        )
        .unwrap();

        let mut exe = Executable::create(&rt);
        assert!(!exe.is_frozen());
        assert_eq!(exe.symbol("add_arrays.kd").err(), Some(ExecutableError::NotFrozen));
        assert_eq!(
            exe.load_code_object(&agents[1], &co).err(),
            Some(ExecutableError::InvalidAgent),
        );

        exe.load_code_object(&agents[0], &co).unwrap();
        exe.freeze().unwrap();
        assert!(exe.is_frozen());
        assert_eq!(exe.freeze().err(), Some(ExecutableError::AlreadyFrozen));
        assert_eq!(
            exe.load_code_object(&agents[0], &co).err(),
            Some(ExecutableError::AlreadyFrozen),
        );

        let info = exe.symbol("add_arrays.kd").unwrap();
        assert_ne!(info.kernel_object, 0);
        assert_eq!(info.group_segment_size, 0);
        assert_eq!(info.kernarg_segment_size, 24 + size_of::<ImplicitArgs>() as u32);
        assert_eq!(exe.symbol("add_arrays").err(), Some(ExecutableError::SymbolNotFound));
    }
}
