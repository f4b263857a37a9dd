use super::WorkItem;
use bytemuck::{Pod, Zeroable};

#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct Args {
    img_out: u64,
    img_in: u64,
    width: i32,
    height: i32,
}

/// out[p] = 0.299 R + 0.587 G + 0.114 B,下取整;越界像素不写。
pub(super) unsafe fn color_to_grayscale(item: &WorkItem) {
    let Args {
        img_out,
        img_in,
        width,
        height,
    } = item.args();
    let index = item.global_id(0) as i32;
    if index < width * height {
        let src = (img_in as usize as *const u8).add(index as usize * 3);
        let r = src.read() as f32;
        let g = src.add(1).read() as f32;
        let b = src.add(2).read() as f32;
        (img_out as usize as *mut u8)
            .add(index as usize)
            .write((0.299 * r + 0.587 * g + 0.114 * b) as u8);
    }
}

/// 3×3 窗口均值,除数为界内贡献者个数。
pub(super) unsafe fn blur_monochrome(item: &WorkItem) {
    let Args {
        img_out,
        img_in,
        width,
        height,
    } = item.args();
    let x = item.global_id(0) as i32;
    let y = item.global_id(1) as i32;
    if x >= width || y >= height {
        return;
    }

    let img_in = img_in as usize as *const u8;
    let mut sum = 0i32;
    let mut count = 0i32;
    for dy in -1..=1 {
        for dx in -1..=1 {
            let nx = x + dx;
            let ny = y + dy;
            if nx >= 0 && nx < width && ny >= 0 && ny < height {
                sum += img_in.add((ny * width + nx) as usize).read() as i32;
                count += 1;
            }
        }
    }
    (img_out as usize as *mut u8)
        .add((y * width + x) as usize)
        .write((sum / count) as u8);
}

/// 同上,逐 R、G、B 三通道。
pub(super) unsafe fn blur_rgb(item: &WorkItem) {
    let Args {
        img_out,
        img_in,
        width,
        height,
    } = item.args();
    let x = item.global_id(0) as i32;
    let y = item.global_id(1) as i32;
    if x >= width || y >= height {
        return;
    }

    let img_in = img_in as usize as *const u8;
    let mut sum = [0i32; 3];
    let mut count = 0i32;
    for dy in -1..=1 {
        for dx in -1..=1 {
            let nx = x + dx;
            let ny = y + dy;
            if nx >= 0 && nx < width && ny >= 0 && ny < height {
                let src = img_in.add((ny * width + nx) as usize * 3);
                for (ch, acc) in sum.iter_mut().enumerate() {
                    *acc += src.add(ch).read() as i32;
                }
                count += 1;
            }
        }
    }
    let dst = (img_out as usize as *mut u8).add((y * width + x) as usize * 3);
    for (ch, acc) in sum.iter().enumerate() {
        dst.add(ch).write((acc / count) as u8);
    }
}
