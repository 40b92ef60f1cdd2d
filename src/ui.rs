// UI layer: the numeric command menu and the handlers behind it.
// Input comes through a `Console` (dialoguer on a real terminal) and all
// rendering goes to a `Write` sink, so whole sessions can be scripted.

use crate::api::{ApiClient, DownloadOutcome, Transport, UploadRequest};
use crate::config::{ClientConfig, DEFAULT_CONFIG_FILE};
use crate::error::{ClientError, Result};
use crate::geo;
use crossterm::style::Stylize;
use dialoguer::Input;
use log::{debug, error};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Source of user input, one line per prompt.
pub trait Console {
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;
}

/// Console reading from the terminal with `dialoguer`.
pub struct TerminalConsole;

impl Console for TerminalConsole {
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    End,
    Stats,
    Users,
    Assets,
    Download,
    DownloadAndDisplay,
    BucketContents,
    Upload,
}

impl Command {
    /// Parse a menu selection. Anything but a number from 0 to 7 is `None`.
    pub fn parse(input: &str) -> Option<Self> {
        let command = match input.trim().parse::<u32>().ok()? {
            0 => Command::End,
            1 => Command::Stats,
            2 => Command::Users,
            3 => Command::Assets,
            4 => Command::Download,
            5 => Command::DownloadAndDisplay,
            6 => Command::BucketContents,
            7 => Command::Upload,
            _ => return None,
        };
        Some(command)
    }

    fn handler_name(self) -> &'static str {
        match self {
            Command::End => "end",
            Command::Stats => "stats",
            Command::Users => "users",
            Command::Assets => "assets",
            Command::Download | Command::DownloadAndDisplay => "download",
            Command::BucketContents => "bucket_contents",
            Command::Upload => "upload",
        }
    }
}

const MENU: &[&str] = &[
    "   0 => end",
    "   1 => stats",
    "   2 => users",
    "   3 => assets",
    "   4 => download",
    "   5 => download and display",
    "   6 => bucket contents",
    "   7 => upload",
];

/// Ask which configuration file to use. A blank answer picks the default.
pub fn choose_config_file(console: &mut impl Console, out: &mut impl Write) -> io::Result<PathBuf> {
    writeln!(out, "What config file to use for this session?")?;
    writeln!(out, "Press ENTER to use default (photoapp-config),")?;
    writeln!(out, "otherwise enter name of config file>")?;
    out.flush()?;
    let answer = console.read_line("Config file")?;
    let answer = answer.trim();
    if answer.is_empty() {
        Ok(PathBuf::from(DEFAULT_CONFIG_FILE))
    } else {
        Ok(PathBuf::from(answer))
    }
}

/// Shows a saved image to the user.
pub type Viewer = Box<dyn Fn(&Path) -> Result<()>>;

/// One interactive session against the web service.
pub struct Session<T: Transport, C: Console, W: Write> {
    api: ApiClient<T>,
    console: C,
    out: W,
    upload_file: PathBuf,
    exif_file: PathBuf,
    download_dir: PathBuf,
    viewer: Viewer,
    color: bool,
}

impl<T: Transport, C: Console, W: Write> Session<T, C, W> {
    pub fn new(api: ApiClient<T>, config: &ClientConfig, console: C, out: W) -> Self {
        Session {
            api,
            console,
            out,
            upload_file: config.upload_file.clone(),
            exif_file: config.exif_file.clone(),
            download_dir: PathBuf::from("."),
            viewer: Box::new(display_image),
            color: false,
        }
    }

    /// Highlight failures with terminal colors. Only worth enabling when
    /// `out` is a terminal.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Replace the OS image viewer used by "download and display".
    pub fn with_viewer(mut self, viewer: impl Fn(&Path) -> Result<()> + 'static) -> Self {
        self.viewer = Box::new(viewer);
        self
    }

    /// Save downloaded images under `dir` instead of the working directory.
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Run the menu loop until the user enters 0. Handler failures are
    /// reported and the loop goes on; only console or output failures end
    /// the session early.
    pub fn run(&mut self) -> anyhow::Result<()> {
        loop {
            self.print_menu()?;
            let line = self.console.read_line("Command")?;
            match Command::parse(&line) {
                Some(Command::End) => break,
                Some(command) => self.dispatch(command),
                None => writeln!(self.out, "** Unknown command, try again...")?,
            }
        }
        writeln!(self.out)?;
        writeln!(self.out, "** done **")?;
        self.out.flush()?;
        Ok(())
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, ">> Enter a command:")?;
        for line in MENU {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()
    }

    /// Run one command, reporting its failure instead of returning it.
    pub fn dispatch(&mut self, command: Command) {
        let result = match command {
            Command::End => Ok(()),
            Command::Stats => self.stats(),
            Command::Users => self.users(),
            Command::Assets => self.assets(),
            Command::Download => self.download_prompted(false),
            Command::DownloadAndDisplay => self.download_prompted(true),
            Command::BucketContents => self.bucket_contents(),
            Command::Upload => self.upload(),
        };
        if let Err(err) = result {
            self.report(command.handler_name(), &err);
        }
    }

    fn report(&mut self, handler: &str, err: &ClientError) {
        let shown = match err {
            ClientError::HttpStatus { status, url } => self.print_failure(*status, url, None),
            ClientError::Application {
                status,
                url,
                message,
            } => self.print_failure(*status, url, Some(message.as_str())),
            _ => {
                error!("{handler}() failed:");
                if let Some(url) = err.url() {
                    error!("url: {url}");
                }
                error!("{err}");
                Ok(())
            }
        };
        if let Err(e) = shown {
            error!("could not write to console: {e}");
        }
    }

    fn print_failure(&mut self, status: u16, url: &str, message: Option<&str>) -> io::Result<()> {
        let line = format!("Failed with status code: {status}");
        if self.color {
            writeln!(self.out, "{}", line.red())?;
        } else {
            writeln!(self.out, "{line}")?;
        }
        writeln!(self.out, "url: {url}")?;
        if let Some(message) = message {
            writeln!(self.out, "Error message: {message}")?;
        }
        Ok(())
    }

    pub fn stats(&mut self) -> Result<()> {
        let stats = self.api.stats()?;
        writeln!(self.out, "bucket status: {}", stats.message)?;
        writeln!(self.out, "# of users: {}", stats.num_users)?;
        writeln!(self.out, "# of assets: {}", stats.num_assets)?;
        Ok(())
    }

    pub fn users(&mut self) -> Result<()> {
        for user in self.api.users()? {
            writeln!(self.out, "{}", user.userid)?;
            writeln!(self.out, "  {}", user.email)?;
            writeln!(self.out, "  {} , {}", user.lastname, user.firstname)?;
            writeln!(self.out, "  {}", user.bucketfolder)?;
        }
        Ok(())
    }

    pub fn assets(&mut self) -> Result<()> {
        for asset in self.api.assets()? {
            writeln!(self.out, "{}", asset.assetid)?;
            writeln!(self.out, "  {}", asset.userid)?;
            writeln!(self.out, "  {}", asset.assetname)?;
            writeln!(self.out, "  {}", asset.bucketkey)?;
        }
        Ok(())
    }

    fn download_prompted(&mut self, display: bool) -> Result<()> {
        let answer = self.console.read_line("Enter asset id")?;
        match answer.trim().parse::<i64>() {
            Ok(assetid) => self.download(assetid, display),
            Err(_) => {
                writeln!(self.out, "** Invalid asset id, try again...")?;
                Ok(())
            }
        }
    }

    /// Download an asset into the download directory, overwriting any file
    /// of the same name, and optionally open it in the image viewer.
    pub fn download(&mut self, assetid: i64, display: bool) -> Result<()> {
        let asset = match self.api.download(assetid)? {
            DownloadOutcome::NotFound => {
                writeln!(self.out, "No such asset...")?;
                return Ok(());
            }
            DownloadOutcome::Found(asset) => asset,
        };

        writeln!(self.out, "userid: {}", asset.user_id)?;
        writeln!(self.out, "asset name: {}", asset.asset_name)?;
        writeln!(self.out, "bucket key: {}", asset.bucket_key)?;

        // Only the final component of the reported name is trusted.
        let file_name = Path::new(&asset.asset_name)
            .file_name()
            .ok_or_else(|| ClientError::Payload(format!("bad asset name '{}'", asset.asset_name)))?;
        let bytes = asset.data.decode()?;
        let path = self.download_dir.join(file_name);
        std::fs::write(&path, &bytes)?;
        writeln!(
            self.out,
            "Downloaded from S3 and saved as '{}'",
            file_name.to_string_lossy()
        )?;

        if display {
            (self.viewer)(&path)?;
        }
        Ok(())
    }

    /// Page through the bucket listing, asking before each further page.
    pub fn bucket_contents(&mut self) -> Result<()> {
        let mut start_after: Option<String> = None;
        loop {
            let page = self.api.bucket_page(start_after.as_deref())?;
            let Some(last) = page.last() else {
                break;
            };
            for item in &page {
                writeln!(self.out, "{}", item.key)?;
                writeln!(self.out, "  {}", item.last_modified)?;
                writeln!(self.out, "  {}", item.size)?;
            }
            let cursor = last.key.clone();

            self.out.flush()?;
            let answer = self.console.read_line("another page? [y/n]")?;
            if answer.trim() != "y" {
                break;
            }
            debug!("next bucket page starts after {cursor}");
            start_after = Some(cursor);
        }
        Ok(())
    }

    /// Upload the configured image for a user, tagged with the GPS fix
    /// found in the configured EXIF source image when there is one.
    pub fn upload(&mut self) -> Result<()> {
        let answer = self.console.read_line("Enter user id")?;
        let Ok(userid) = answer.trim().parse::<i64>() else {
            writeln!(self.out, "** Invalid user id, try again...")?;
            return Ok(());
        };

        let bytes = std::fs::read(&self.upload_file)?;
        let assetname = self
            .upload_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.upload_file.display().to_string());
        let mut request = UploadRequest::new(assetname, &bytes);

        match geo::read_gps(&self.exif_file)? {
            Some(fix) => {
                writeln!(self.out, "Latitude: {}", fix.latitude)?;
                writeln!(self.out, "Longitude: {}", fix.longitude)?;
                if let Some(date_time) = &fix.date_time {
                    writeln!(self.out, "date time {date_time}")?;
                }
                request = request.with_location(&fix);
            }
            None => writeln!(self.out, "No GPS data found in the image.")?,
        }

        let reply = self.api.upload(userid, &request)?;
        writeln!(self.out, "{reply:#}")?;
        Ok(())
    }
}

fn display_image(path: &Path) -> Result<()> {
    opener::open(path).map_err(|e| ClientError::Display(e.to_string()))
}
