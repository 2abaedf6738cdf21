use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::frame_source::FrameSource;

/// Decodes frames from a video file or capture device via ffmpeg-next.
///
/// Each decoded frame is converted to RGB24. An explicit input format
/// (e.g. `v4l2`, `avfoundation`, `dshow`) opens a capture device instead
/// of probing a file.
pub struct FfmpegFrameSource {
    input: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    frame_index: usize,
    flushing: bool,
}

// Safety: FfmpegFrameSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegFrameSource {}

impl FfmpegFrameSource {
    pub fn open(
        path: &Path,
        input_format: Option<&str>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let input = match input_format {
            None => ffmpeg_next::format::input(path)?,
            Some(name) => {
                let format = ffmpeg_next::device::input::video()
                    .find(|f| f.name() == name)
                    .ok_or_else(|| format!("Unknown capture input format '{name}'"))?;
                ffmpeg_next::format::open_with(
                    path,
                    &ffmpeg_next::format::Format::Input(format),
                    ffmpeg_next::Dictionary::new(),
                )?
                .input()
            }
        };

        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::info!("Opened {} ({width}x{height})", path.display());

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            width,
            height,
            frame_index: 0,
            flushing: false,
        })
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&decoded, &mut rgb_frame)?;

        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, 3, self.frame_index);
        self.frame_index += 1;
        Ok(Some(frame))
    }
}

impl FrameSource for FfmpegFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        loop {
            if let Some(frame) = self.try_receive()? {
                return Ok(Some(frame));
            }
            if self.flushing {
                return Ok(None);
            }

            match self.input.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != self.stream_index {
                        continue;
                    }
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        log::debug!("Skipping undecodable packet: {e}");
                    }
                }
                None => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                }
            }
        }
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer,
/// dropping any per-row padding.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_len = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_len]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_gray_video(path: &Path, num_frames: usize, width: u32, height: u32) {
        ffmpeg_next::init().unwrap();
        let fps = 25;
        let time_base = ffmpeg_next::Rational(1, fps);

        let mut octx = ffmpeg_next::format::output(path).unwrap();
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);
        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
        let mut ost = octx.add_stream(Some(codec)).unwrap();

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();
        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }
        let mut encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .unwrap();
        ost.set_parameters(&encoder);
        octx.write_header().unwrap();
        let ost_time_base = octx.stream(0).unwrap().time_base();

        for i in 0..num_frames {
            let mut yuv = ffmpeg_next::util::frame::video::Video::new(
                ffmpeg_next::format::Pixel::YUV420P,
                width,
                height,
            );
            for plane in 0..3 {
                let fill = if plane == 0 { 60 + i as u8 * 30 } else { 128 };
                yuv.data_mut(plane).fill(fill);
            }
            yuv.set_pts(Some(i as i64));
            encoder.send_frame(&yuv).unwrap();

            let mut packet = ffmpeg_next::Packet::empty();
            while encoder.receive_packet(&mut packet).is_ok() {
                packet.set_stream(0);
                packet.rescale_ts(time_base, ost_time_base);
                packet.write_interleaved(&mut octx).unwrap();
            }
        }

        encoder.send_eof().unwrap();
        let mut packet = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(0);
            packet.rescale_ts(time_base, ost_time_base);
            packet.write_interleaved(&mut octx).unwrap();
        }
        octx.write_trailer().unwrap();
    }

    #[test]
    fn test_decodes_every_frame_then_ends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        write_gray_video(&path, 4, 64, 48);

        let mut source = FfmpegFrameSource::open(&path, None).unwrap();
        let mut indices = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            assert_eq!((frame.width(), frame.height(), frame.channels()), (64, 48, 3));
            indices.push(frame.index());
        }
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_open_nonexistent_fails() {
        assert!(FfmpegFrameSource::open(Path::new("/nonexistent/clip.mp4"), None).is_err());
    }

    #[test]
    fn test_unknown_input_format_fails() {
        let result = FfmpegFrameSource::open(Path::new("/dev/video0"), Some("no-such-device"));
        assert!(result.is_err());
    }
}
