use super::*;
use crate::foundation::core::Fps;

fn cfg(size: u32, format: ContainerFormat) -> EncodeConfig {
    EncodeConfig::square(size, Fps::new(30).unwrap(), format)
}

#[test]
fn flatten_premul_alpha_0_returns_bg() {
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg(&mut dst, &[0, 0, 0, 0], Rgba8::opaque(10, 20, 30)).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_premul_alpha_255_is_identity() {
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg(&mut dst, &[1, 2, 3, 255], Rgba8::opaque(10, 20, 30)).unwrap();
    assert_eq!(dst, vec![1, 2, 3, 255]);
}

#[test]
fn flatten_straight_half_alpha_blends() {
    let mut dst = vec![0u8; 4];
    flatten_straight_over_bg(&mut dst, &[255, 0, 0, 128], Rgba8::BLACK).unwrap();
    assert_eq!(dst, vec![128, 0, 0, 255]);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(flatten_premul_over_bg(&mut dst, &[0; 4], Rgba8::BLACK).is_err());
}

#[test]
fn args_select_codec_and_container() {
    let mp4 = ffmpeg_args(&cfg(64, ContainerFormat::Mp4)).join(" ");
    assert!(mp4.contains("-c:v libx264"));
    assert!(mp4.contains("-movflags frag_keyframe+empty_moov+default_base_moof -f mp4"));
    assert!(mp4.contains("-s 64x64"));
    assert!(mp4.contains("-r 30"));
    assert!(mp4.ends_with("pipe:1"));
    assert!(!mp4.contains("pad="));

    let webm = ffmpeg_args(&cfg(65, ContainerFormat::Webm)).join(" ");
    assert!(webm.contains("-c:v libvpx-vp9"));
    assert!(webm.contains("-f webm"));
    assert!(webm.contains("pad=ceil(iw/2)*2:ceil(ih/2)*2"));
}

#[test]
fn push_before_begin_fails() {
    let mut enc = FfmpegEncoder::new();
    let frame = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 16],
        premultiplied: true,
    };
    assert!(enc.push_frame(&frame, 0.0).is_err());
    assert!(enc.finish().is_err());
    enc.abort();
}

#[test]
fn encodes_webm_when_ffmpeg_is_available() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    let mut enc = FfmpegEncoder::new();
    enc.begin(cfg(64, ContainerFormat::Webm)).unwrap();
    for k in 0..6u8 {
        let frame = FrameRGBA {
            width: 64,
            height: 64,
            data: [k * 40, 0, 0, 255].repeat(64 * 64),
            premultiplied: true,
        };
        enc.push_frame(&frame, f64::from(k) / 30.0).unwrap();
    }
    let bytes = enc.finish().unwrap();
    // EBML magic.
    assert_eq!(&bytes[..4], &[0x1A, 0x45, 0xDF, 0xA3]);
}
