use anyhow::{Context, Result};
use animpack::{Animation, FrameBuffer, GlobalHeader, ImageFormat, ImageHeader};
use clap::{Parser, Subcommand};
use memmap::MmapOptions;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::converter::{Converter, ImageSequenceConverter, SequenceFormat};

mod converter;

fn map_file(path: &Path) -> Result<memmap::Mmap> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mmap = unsafe { MmapOptions::new().map(&file)? };
    Ok(mmap)
}

fn extract_file(
    path: impl AsRef<Path>,
    output: impl AsRef<Path>,
    format: SequenceFormat,
    clear: bool,
) -> Result<()> {
    let mmap = map_file(path.as_ref())?;
    let animation = Animation::new(mmap.as_ref())?;
    log::info!("extracting {:?}", animation.header());

    let mut converter = ImageSequenceConverter::new(output, format);
    converter.prepare(animation.width(), animation.height(), animation.frame_rate())?;

    let mut buffer = FrameBuffer::new(animation.width(), animation.height());
    for index in 0..animation.frame_count() {
        if clear {
            buffer.clear();
        }
        animation
            .draw_frame(index, &mut buffer)
            .with_context(|| format!("decoding frame {}", index))?;
        converter.convert_frame(buffer.to_rgba_image()?, index)?;
        log::info!("Decoded {} frame(s)", index + 1);
    }

    converter.finish()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct RecordInfo {
    index: usize,
    offset: usize,
    format: Option<ImageFormat>,
    header: ImageHeader,
}

#[derive(Debug, Serialize)]
struct ContainerInfo {
    header: GlobalHeader,
    records: Vec<RecordInfo>,
}

fn describe_file(path: impl AsRef<Path>, json: bool) -> Result<()> {
    let mmap = map_file(path.as_ref())?;
    let animation = Animation::new(mmap.as_ref())?;
    let mut records = Vec::with_capacity(animation.frame_count());
    for frame in animation.frames() {
        let frame = frame?;
        records.push(RecordInfo {
            index: frame.index,
            offset: frame.offset,
            format: frame.header.format().ok(),
            header: frame.header,
        });
    }
    let info = ContainerInfo {
        header: *animation.header(),
        records,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }
    println!(
        "{}x{}, {} frame(s) at {} fps",
        info.header.width, info.header.height, info.header.frame_count, info.header.frame_rate
    );
    for record in &info.records {
        let format = record
            .format
            .map(ImageFormat::fourcc)
            .unwrap_or_else(|| format!("{:#010x}", record.header.format));
        println!(
            "#{:<4} @{:<8} {} {}x{}+{}+{} {} byte(s)",
            record.index,
            record.offset,
            format,
            record.header.width,
            record.header.height,
            record.header.xoffset,
            record.header.yoffset,
            record.header.data_length
        );
    }
    Ok(())
}

#[derive(Debug, clap::ValueEnum, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum PayloadFormat {
    /// Word run-length encoded pixels
    #[default]
    Rlen,
    /// Uncompressed pixels
    Pixl,
    /// PNG
    Ping,
}

impl From<PayloadFormat> for ImageFormat {
    fn from(format: PayloadFormat) -> Self {
        match format {
            PayloadFormat::Rlen => ImageFormat::RunLengthCompressedPixels,
            PayloadFormat::Pixl => ImageFormat::UncompressedPixels,
            PayloadFormat::Ping => ImageFormat::Png,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a container from images of canvas size
    Pack {
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long)]
        width: u32,

        #[arg(long)]
        height: u32,

        #[arg(short = 'r', long, default_value_t = animpack::writer::DEFAULT_FRAME_RATE)]
        frame_rate: u32,

        #[arg(short, long, value_enum, default_value_t)]
        format: PayloadFormat,

        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Decode every frame to an image sequence
    Extract {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long, value_enum, default_value_t)]
        format: SequenceFormat,

        /// Start every frame from a transparent canvas
        #[arg(long)]
        clear: bool,
    },
    /// Print container headers
    Info {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let args = Args::parse();
    match args.command {
        Command::Pack {
            output,
            width,
            height,
            frame_rate,
            format,
            inputs,
        } => animpack::writer::write(
            output,
            width,
            height,
            frame_rate,
            inputs.as_slice(),
            format.into(),
        )?,
        Command::Extract {
            input,
            output,
            format,
            clear,
        } => extract_file(input, output, format, clear)?,
        Command::Info { input, json } => describe_file(input, json)?,
    }
    Ok(())
}
