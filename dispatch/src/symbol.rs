use crate::error::{not_frozen, symbol_not_found, ResolveError};
use dev_virtual_gpu::{Executable, ExecutableError};
use log::info;
use lru::LruCache;
use std::{num::NonZeroUsize, sync::Mutex};

/// 已解析的入口点:设备可调用句柄与解析时取得的资源需求。
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EntryPoint {
    pub kernel_object: u64,
    pub group_segment_size: u32,
    pub kernarg_segment_size: u32,
}

/// 按 (可执行程序, 符号名) 记忆解析结果。
pub struct SymbolResolver {
    cache: Mutex<LruCache<(u64, String), EntryPoint>>,
}

impl Default for SymbolResolver {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolResolver {
    pub fn new() -> Self {
        Self::with_capacity(16)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(NonZeroUsize::new(capacity.max(1)).unwrap())),
        }
    }

    /// 在冻结的可执行程序中按名精确解析入口。
    pub fn resolve(&self, executable: &Executable, name: &str) -> Result<EntryPoint, ResolveError> {
        let key = (executable.id(), name.to_string());
        if let Some(entry) = self.cache.lock().unwrap().get(&key) {
            return Ok(*entry);
        }

        let info = executable.symbol(name).map_err(|e| match e {
            ExecutableError::NotFrozen => not_frozen("executable not frozen"),
            _ => symbol_not_found(format!("symbol {name:?}: {e:?}")),
        })?;
        let entry = EntryPoint {
            kernel_object: info.kernel_object,
            group_segment_size: info.group_segment_size,
            kernarg_segment_size: info.kernarg_segment_size,
        };
        info!("kernel arg size: {}", entry.kernarg_segment_size);
        self.cache.lock().unwrap().put(key, entry);
        Ok(entry)
    }
}

#[cfg(test)]
mod test {
    use super::SymbolResolver;
    use crate::error::ResolveErrorKind;
    use dev_virtual_gpu::{isa, CodeObject, CodeObjectBuilder, Executable, Runtime};

    fn executable(rt: &Runtime, frozen: bool) -> Executable {
        let co = CodeObject::deserialize(
            &CodeObjectBuilder::new()
                .entry("add_arrays.kd", isa::ADD_ARRAYS, 24, 0)
                .serialize(),
        )
        .unwrap();
        let mut exe = Executable::create(rt);
        exe.load_code_object(&rt.agents()[0], &co).unwrap();
        if frozen {
            exe.freeze().unwrap();
        }
        exe
    }

    #[test]
    fn test_resolve() {
        let rt = Runtime::new();
        let exe = executable(&rt, true);
        let resolver = SymbolResolver::new();

        let entry = resolver.resolve(&exe, "add_arrays.kd").unwrap();
        assert_ne!(entry.kernel_object, 0);
        assert!(entry.kernarg_segment_size >= 24);
        // 缓存命中与否结果一致
        assert_eq!(resolver.resolve(&exe, "add_arrays.kd").unwrap(), entry);

        let e = resolver.resolve(&exe, "add_arrays").err().unwrap();
        assert_eq!(e.kind, ResolveErrorKind::SymbolNotFound);
    }

    #[test]
    fn test_not_frozen() {
        let rt = Runtime::new();
        let exe = executable(&rt, false);
        let e = SymbolResolver::new().resolve(&exe, "add_arrays.kd").err().unwrap();
        assert_eq!(e.kind, ResolveErrorKind::NotFrozen);
    }
}
