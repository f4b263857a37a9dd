use crate::{
    device::Topology,
    error::{
        deserialize_failed, file_not_found, freeze_failed, load_failed, no_system_region,
        staging_failed, LoadError,
    },
};
use dev_virtual_gpu::{CodeObject, Executable, Runtime};
use log::debug;
use std::{fs, path::Path};

/// 读入预编译代码对象文件并装载为冻结的可执行程序。
///
/// 整个文件经 system 内存区暂存后交给设备运行时反序列化,
/// 宿主与设备两侧管线都能看到这份字节;反序列化一结束暂存即归还。
/// 冻结不可逆,且先于任何符号解析。
pub fn load(
    runtime: &Runtime,
    topology: &Topology,
    path: impl AsRef<Path>,
) -> Result<Executable, LoadError> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .map_err(|e| file_not_found(format!("failed to load {}: {e}", path.display())))?;

    let region = topology
        .regions
        .system
        .as_ref()
        .ok_or_else(|| no_system_region("no system region to stage code object"))?;
    let mut staging = region
        .alloc(bytes.len().max(1))
        .map_err(|e| staging_failed(format!("staging {} bytes: {e:?}", bytes.len())))?;
    let view = staging
        .host_view_mut()
        .ok_or_else(|| staging_failed("system region not host accessible"))?;
    view[..bytes.len()].copy_from_slice(&bytes);

    let code_object = CodeObject::deserialize(&view[..bytes.len()])
        .map_err(|e| deserialize_failed(format!("{}: {e:?}", path.display())))?;
    drop(staging);
    debug!(
        "code object {}: {} entries",
        path.display(),
        code_object.entry_count(),
    );

    let mut executable = Executable::create(runtime);
    executable
        .load_code_object(&topology.gpu, &code_object)
        .map_err(|e| load_failed(format!("{e:?}")))?;
    executable
        .freeze()
        .map_err(|e| freeze_failed(format!("{e:?}")))?;
    Ok(executable)
}
