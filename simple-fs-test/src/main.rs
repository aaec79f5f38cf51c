use clap::Parser;
use log::{error, info};
use simplefs::layout::{Block, BLOCK_SIZE, MAX_FILE_SIZE, ROOT_INODE, TOTAL_BLOCKS};
use simplefs::{BlockDevice, FsError, SimpleFileSystem};
use spin::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// build a disk image for the kernel and copy host files into its root
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// disk image to create or update
    image: PathBuf,
    /// lay out an empty file system first
    #[arg(long)]
    format: bool,
    /// host files to copy into the root directory
    files: Vec<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum ToolError {
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("simplefs: {0}")]
    Fs(FsError),
    #[error("{}: no usable file name", .0.display())]
    BadName(PathBuf),
    #[error("{}: {} bytes, files hold at most {}", .0.display(), .1, MAX_FILE_SIZE)]
    TooLarge(PathBuf, usize),
}

// disk image file, one 64-byte block at a time
struct FileBlockDev(Mutex<File>);

impl FileBlockDev {
    fn open(path: &PathBuf, create: bool) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(create)
            .open(path)?;
        let size = TOTAL_BLOCKS as u64 * BLOCK_SIZE as u64;
        if create {
            file.set_len(size)?;
        } else if file.metadata()?.len() != size {
            // an existing file is never resized
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "not a disk image, wrong length",
            ));
        }
        return Ok(Self(Mutex::new(file)));
    }
}

// BlockDevice has no error channel, a failing image file ends the tool
impl BlockDevice for FileBlockDev {
    fn read(&self, block_id: u32, data: &mut Block) {
        let mut file = self.0.lock();
        file.seek(SeekFrom::Start(block_id as u64 * BLOCK_SIZE as u64))
            .expect("file seek error");
        file.read_exact(data).expect("file read error");
    }

    fn write(&self, block_id: u32, data: &Block) {
        let mut file = self.0.lock();
        file.seek(SeekFrom::Start(block_id as u64 * BLOCK_SIZE as u64))
            .expect("file seek error");
        file.write_all(data).expect("file write error");
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), ToolError> {
    let block_dev: Arc<dyn BlockDevice> = Arc::new(FileBlockDev::open(&args.image, args.format)?);
    let fs = if args.format {
        info!("formatting {}", args.image.display());
        SimpleFileSystem::format(block_dev)
    } else {
        SimpleFileSystem::mount(block_dev).map_err(ToolError::Fs)?
    };
    for path in args.files.iter() {
        copy_in(&fs, path)?;
    }
    return Ok(());
}

// copy one host file into the root directory, replacing its content
fn copy_in(fs: &SimpleFileSystem, path: &PathBuf) -> Result<(), ToolError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ToolError::BadName(path.clone()))?;
    let mut data = Vec::new();
    File::open(path)?.read_to_end(&mut data)?;
    if data.len() > MAX_FILE_SIZE {
        return Err(ToolError::TooLarge(path.clone(), data.len()));
    }
    let root = fs.read_inode(ROOT_INODE).map_err(ToolError::Fs)?;
    let inode = fs.open(ROOT_INODE, &root, name).map_err(ToolError::Fs)?;
    let written = fs.write_file(inode, &data).map_err(ToolError::Fs)?;
    info!("copied {} as /{} ({} bytes)", path.display(), name, written);
    return Ok(());
}
