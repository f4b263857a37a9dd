use bytemuck::{Pod, Zeroable};

/// 隐式内核参数块,紧随显式参数之后,字段顺序与设备程序经
/// 隐式参数指针读取的约定一致。未用字段保持零。
#[derive(Clone, Copy, PartialEq, Eq, Debug, Pod, Zeroable)]
#[repr(C)]
pub struct ImplicitArgs {
    pub block_count: [u32; 3],
    pub group_size: [u16; 3],
    pub remainder: [u16; 3],
    pub correlation_id: u64,
    pub reserved0: u64,
    pub global_offset: [u64; 3],
    pub grid_dims: u16,
    pub reserved1: [u16; 3],
    pub printf_buffer: u64,
    pub hostcall_buffer: u64,
    pub multigrid_sync: u64,
    pub heap: u64,
    pub default_queue: u64,
    pub completion_action: u64,
    pub dynamic_group_size: u32,
    pub private_base: u32,
    pub group_base: u32,
    pub reserved2: u32,
}

/// 隐式参数块在内核参数缓冲中的偏移:显式参数大小向上对齐到 8 字节。
#[inline]
pub const fn implicit_args_offset(explicit_size: usize) -> usize {
    (explicit_size + 7) & !7
}

#[cfg(test)]
mod test {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_layout() {
        assert_eq!(offset_of!(ImplicitArgs, block_count), 0);
        assert_eq!(offset_of!(ImplicitArgs, group_size), 12);
        assert_eq!(offset_of!(ImplicitArgs, remainder), 18);
        assert_eq!(offset_of!(ImplicitArgs, correlation_id), 24);
        assert_eq!(offset_of!(ImplicitArgs, reserved0), 32);
        assert_eq!(offset_of!(ImplicitArgs, global_offset), 40);
        assert_eq!(offset_of!(ImplicitArgs, grid_dims), 64);
        assert_eq!(offset_of!(ImplicitArgs, printf_buffer), 72);
        assert_eq!(offset_of!(ImplicitArgs, hostcall_buffer), 80);
        assert_eq!(offset_of!(ImplicitArgs, multigrid_sync), 88);
        assert_eq!(offset_of!(ImplicitArgs, heap), 96);
        assert_eq!(offset_of!(ImplicitArgs, default_queue), 104);
        assert_eq!(offset_of!(ImplicitArgs, completion_action), 112);
        assert_eq!(offset_of!(ImplicitArgs, dynamic_group_size), 120);
        assert_eq!(offset_of!(ImplicitArgs, private_base), 124);
        assert_eq!(offset_of!(ImplicitArgs, group_base), 128);
        assert_eq!(size_of::<ImplicitArgs>(), 136);
    }

    #[test]
    fn test_offset() {
        assert_eq!(implicit_args_offset(0), 0);
        assert_eq!(implicit_args_offset(1), 8);
        assert_eq!(implicit_args_offset(8), 8);
        assert_eq!(implicit_args_offset(24), 24);
        assert_eq!(implicit_args_offset(36), 40);
    }
}
