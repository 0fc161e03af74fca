#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::{
    fs::File,
    io::{self, Cursor, Read, Seek, Write},
    path::Path,
};

use bytes::Bytes;
use camino::Utf8Path;
use tracing::debug;
use zip::{read::ZipFile, write::FileOptions, ZipArchive, ZipWriter};

pub use crate::comic_info::ComicInfo;
pub use crate::errors::{Error, Result};

pub mod comic_info;
pub mod errors;

/// We artificially limit the amount of accepted files to 65535 files per Cbz
/// as it was the limit of the very first zip spec
pub static MAX_FILE_NUMBER: usize = u16::MAX as usize;

/// The padding used to name pages, `0001.png` sorts before `0010.png` in every reader
pub static COUNTER_SIZE: usize = 4;

/// Name of the metadata sidecar understood by comic readers
pub static COMIC_INFO_FILE_NAME: &str = "ComicInfo.xml";

/// Name of the page at `index` (1-based), zero padded to `COUNTER_SIZE`
#[must_use]
pub fn page_file_name(index: usize, extension: &str) -> String {
    format!("{index:0>COUNTER_SIZE$}.{extension}")
}

pub trait Cbz {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct CbzFile<'a>(ZipFile<'a>);

impl<'a> CbzFile<'a> {
    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn size(&self) -> u64 {
        self.0.size()
    }

    /// Convert the file content to `Bytes`
    ///
    /// ## Errors
    ///
    /// Fails if file size is too large to fit a `usize` on host machine
    /// or if the content can't be read
    pub fn to_bytes(&mut self) -> Result<Bytes> {
        let mut buf = Vec::with_capacity(
            self.size()
                .try_into()
                .map_err(|_| Error::CbzFileSizeConversion)?,
        );

        self.0.read_to_end(&mut buf)?;

        Ok(buf.into())
    }
}

impl<'a> Read for CbzFile<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<'a> From<ZipFile<'a>> for CbzFile<'a> {
    fn from(zip_file: ZipFile<'a>) -> Self {
        Self(zip_file)
    }
}

#[derive(Debug)]
pub struct CbzReader<R> {
    archive: ZipArchive<R>,
}

impl<R> CbzReader<R>
where
    R: Read + Seek,
{
    /// Creates `CbzReader` from a `Read`
    ///
    /// ## Errors
    ///
    /// Fails if the underlying `ZipArchive` can't be created
    pub fn from_reader(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;

        Ok(Self { archive })
    }

    /// Names of all the entries, in the order they were written
    ///
    /// ## Errors
    ///
    /// Fails if an entry can't be read
    pub fn file_names(&mut self) -> Result<Vec<String>> {
        (0..self.archive.len())
            .map(|index| Ok(self.archive.by_index(index)?.name().to_string()))
            .collect()
    }

    /// Lookup the file by `name` in Cbz and returns a `CbzFile`
    ///
    /// ## Errors
    ///
    /// Fails if no such entry exists or if it can't be read
    pub fn read_by_name(&mut self, name: &str) -> Result<CbzFile<'_>> {
        if name.is_empty() {
            return Err(Error::CbzFileNameEmpty);
        }

        Ok(self.archive.by_name(name)?.into())
    }
}

impl CbzReader<File> {
    /// Creates `CbzReader` from a path
    ///
    /// ## Errors
    ///
    /// Fails if the file can't be open or the underlying `ZipArchive` can't be created
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;

        Self::from_reader(file)
    }
}

impl<'a> CbzReader<Cursor<&'a [u8]>> {
    /// Creates `CbzReader` from a bytes slice
    ///
    /// ## Errors
    ///
    /// Fails if the underlying `ZipArchive` can't be created
    pub fn from_bytes_slice(bytes: &'a [u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }
}

impl<R> Cbz for CbzReader<R>
where
    R: Read + Seek,
{
    fn len(&self) -> usize {
        self.archive.len()
    }
}

/// Writes entries one after the other, pages are usually streamed in with `start_file`
/// followed by plain `Write` calls.
pub struct CbzWriter<W: Write + Seek> {
    archive: ZipWriter<W>,
    size: usize,
}

impl<W> CbzWriter<W>
where
    W: Write + Seek,
{
    pub fn new(archive: ZipWriter<W>) -> Self {
        Self {
            archive,
            size: 0,
        }
    }

    /// Creates a `CbzWriter` from a `Write`
    pub fn from_writer(writer: W) -> Self {
        Self::new(ZipWriter::new(writer))
    }

    /// Starts a new entry, every subsequent write goes into it
    ///
    /// ## Errors
    ///
    /// Fails if the name is empty, the Cbz is full (i.e. its size equals `MAX_FILE_NUMBER`),
    /// or the entry header can't be written
    pub fn start_file(&mut self, filename: impl Into<String>) -> Result<()> {
        let filename = filename.into();
        if filename.is_empty() {
            return Err(Error::CbzFileNameEmpty);
        }
        if self.size >= MAX_FILE_NUMBER {
            return Err(Error::CbzTooLarge(MAX_FILE_NUMBER));
        }

        debug!("starting entry {filename}");
        self.archive.start_file(filename, FileOptions::default())?;
        self.size += 1;

        Ok(())
    }

    /// Inserts a whole entry at once
    ///
    /// ## Errors
    ///
    /// Same behavior as `start_file`, or fails if the bytes can't be written
    pub fn insert(&mut self, filename: impl Into<String>, bytes: &[u8]) -> Result<()> {
        self.start_file(filename)?;
        self.archive.write_all(bytes)?;

        Ok(())
    }

    /// Serializes `comic_info` into the `ComicInfo.xml` entry
    ///
    /// ## Errors
    ///
    /// Fails if the metadata can't be serialized or written
    pub fn insert_comic_info(&mut self, comic_info: &ComicInfo) -> Result<()> {
        let xml = comic_info.to_xml()?;

        self.insert(COMIC_INFO_FILE_NAME, xml.as_bytes())
    }

    /// Terminates the Cbz archiving, called on drop anyway but error can't be handled
    ///
    /// ## Errors
    ///
    /// Same errors as the underlying `ZipWriter::finish` method
    pub fn finish(&mut self) -> Result<CbzWriterFinished<W>> {
        let writer = self.archive.finish()?;

        Ok(CbzWriterFinished::new(writer))
    }
}

impl CbzWriter<File> {
    /// Creates the file at `path`, truncating it if it already exists
    ///
    /// ## Errors
    ///
    /// Fails if the file can't be created
    pub fn create(path: impl AsRef<Utf8Path>) -> Result<Self> {
        let file = File::create(path.as_ref())?;

        Ok(Self::from_writer(file))
    }
}

impl Default for CbzWriter<Cursor<Vec<u8>>> {
    fn default() -> Self {
        Self::from_writer(Cursor::new(Vec::new()))
    }
}

impl<W> Cbz for CbzWriter<W>
where
    W: Write + Seek,
{
    fn len(&self) -> usize {
        self.size
    }
}

impl<W> Write for CbzWriter<W>
where
    W: Write + Seek,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.archive.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.archive.flush()
    }
}

pub struct CbzWriterFinished<W> {
    writer: W,
}

impl<W> CbzWriterFinished<W> {
    fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<T: AsRef<[u8]>> AsRef<[u8]> for CbzWriterFinished<Cursor<T>> {
    fn as_ref(&self) -> &[u8] {
        self.writer.get_ref().as_ref()
    }
}
