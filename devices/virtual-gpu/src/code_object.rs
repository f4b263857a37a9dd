use crate::isa::{self, KernelFn};

/// 序列化格式的魔数:`VCO` + 版本 1。
const MAGIC: [u8; 4] = *b"VCO\x01";

/// 反序列化后的设备程序,入口以符号名索引。
/// 内容对宿主是黑盒,入口编号必须指向内建内核。
pub struct CodeObject {
    pub(crate) entries: Vec<Entry>,
}

#[derive(Clone)]
pub(crate) struct Entry {
    pub name: String,
    pub func: KernelFn,
    pub explicit_args_size: u32,
    pub group_segment_size: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CodeObjectError {
    BadMagic,
    Truncated,
    BadName,
    UnknownKernel(u32),
}

impl CodeObject {
    /// 从序列化字节反序列化,校验魔数与每个入口的内核编号。
    pub fn deserialize(bytes: &[u8]) -> Result<Self, CodeObjectError> {
        use CodeObjectError::*;

        let mut reader = Reader(bytes);
        if reader.take(4)? != MAGIC.as_slice() {
            return Err(BadMagic);
        }
        let count = reader.u32()?;
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let len = reader.u16()? as usize;
            let name = std::str::from_utf8(reader.take(len)?)
                .map_err(|_| BadName)?
                .to_string();
            let kernel = reader.u32()?;
            let func = isa::builtin(kernel).ok_or(UnknownKernel(kernel))?;
            entries.push(Entry {
                name,
                func,
                explicit_args_size: reader.u32()?,
                group_segment_size: reader.u32()?,
            });
        }
        Ok(Self { entries })
    }

    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

struct Reader<'a>(&'a [u8]);

impl Reader<'_> {
    fn take(&mut self, n: usize) -> Result<&[u8], CodeObjectError> {
        if self.0.len() < n {
            return Err(CodeObjectError::Truncated);
        }
        let (head, tail) = self.0.split_at(n);
        self.0 = tail;
        Ok(head)
    }

    fn u16(&mut self) -> Result<u16, CodeObjectError> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn u32(&mut self) -> Result<u32, CodeObjectError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }
}

/// 生成代码对象的序列化形式,即测试与演示使用的"预编译二进制"。
#[derive(Default)]
pub struct CodeObjectBuilder {
    entries: Vec<(String, u32, u32, u32)>,
}

impl CodeObjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(
        mut self,
        name: impl Into<String>,
        kernel: u32,
        explicit_args_size: u32,
        group_segment_size: u32,
    ) -> Self {
        self.entries
            .push((name.into(), kernel, explicit_args_size, group_segment_size));
        self
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = MAGIC.to_vec();
        bytes.extend((self.entries.len() as u32).to_le_bytes());
        for (name, kernel, explicit, group) in &self.entries {
            bytes.extend((name.len() as u16).to_le_bytes());
            bytes.extend(name.as_bytes());
            bytes.extend(kernel.to_le_bytes());
            bytes.extend(explicit.to_le_bytes());
            bytes.extend(group.to_le_bytes());
        }
        bytes
    }
}
