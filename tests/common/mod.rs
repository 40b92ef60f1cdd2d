#![allow(dead_code)]

use photoapp_cli::api::{ApiClient, HttpReply, Transport};
use photoapp_cli::config::ClientConfig;
use photoapp_cli::error::{ClientError, Result};
use photoapp_cli::ui::{Console, Session};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

pub const BASE_URL: &str = "http://photoapp.test";

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Get(String),
    Post(String, serde_json::Value),
}

#[derive(Default)]
struct TransportState {
    replies: VecDeque<HttpReply>,
    requests: Vec<Request>,
}

/// Transport answering from a script and recording what was asked.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    state: Rc<RefCell<TransportState>>,
}

impl ScriptedTransport {
    pub fn reply(self, status: u16, body: impl Into<String>) -> Self {
        self.state
            .borrow_mut()
            .replies
            .push_back(HttpReply::new(status, body));
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.borrow().requests.clone()
    }

    fn next(&self, request: Request) -> Result<HttpReply> {
        let mut state = self.state.borrow_mut();
        state.requests.push(request);
        state.replies.pop_front().ok_or_else(|| {
            ClientError::Io(io::Error::new(io::ErrorKind::NotConnected, "no scripted reply"))
        })
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str) -> Result<HttpReply> {
        self.next(Request::Get(url.to_string()))
    }

    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpReply> {
        self.next(Request::Post(url.to_string(), body.clone()))
    }
}

/// Console answering prompts from a script. Runs dry with `UnexpectedEof`.
#[derive(Clone, Default)]
pub struct ScriptedConsole {
    answers: Rc<RefCell<VecDeque<String>>>,
    prompts: Rc<RefCell<Vec<String>>>,
}

impl ScriptedConsole {
    pub fn new(answers: &[&str]) -> Self {
        let console = ScriptedConsole::default();
        console
            .answers
            .borrow_mut()
            .extend(answers.iter().map(|a| a.to_string()));
        console
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }
}

pub fn config() -> ClientConfig {
    ClientConfig {
        webservice: BASE_URL.to_string(),
        upload_file: PathBuf::from("basketball.jpg"),
        exif_file: PathBuf::from("eng.jpg"),
    }
}

pub type TestSession = Session<ScriptedTransport, ScriptedConsole, Vec<u8>>;

pub fn session(
    transport: &ScriptedTransport,
    console: &ScriptedConsole,
    config: &ClientConfig,
) -> TestSession {
    let api = ApiClient::new(transport.clone(), config.webservice.clone());
    Session::new(api, config, console.clone(), Vec::new())
}

pub fn output(session: &TestSession) -> String {
    String::from_utf8_lossy(session.output()).into_owned()
}

/// Degrees, minutes and seconds as numerator/denominator pairs.
pub type Dms = [(u32, u32); 3];

/// Write a bare TIFF whose EXIF block carries a GPS position (latitude,
/// longitude) and a `DateTime`, each only when given.
pub fn write_exif_tiff(path: &std::path::Path, gps: Option<(Dms, Dms)>, date_time: Option<&str>) {
    use exif::experimental::Writer;
    use exif::{Field, In, Rational, Tag, Value};

    let rationals =
        |dms: Dms| Value::Rational(dms.iter().map(|&pair| Rational::from(pair)).collect());
    let position = gps.map(|(latitude, longitude)| {
        [
            Field {
                tag: Tag::GPSLatitude,
                ifd_num: In::PRIMARY,
                value: rationals(latitude),
            },
            Field {
                tag: Tag::GPSLongitude,
                ifd_num: In::PRIMARY,
                value: rationals(longitude),
            },
        ]
    });
    let stamp = date_time.map(|text| Field {
        tag: Tag::DateTime,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    });

    let mut writer = Writer::new();
    for field in position.iter().flatten().chain(stamp.iter()) {
        writer.push_field(field);
    }
    let mut buf = io::Cursor::new(Vec::new());
    writer.write(&mut buf, false).unwrap();
    std::fs::write(path, buf.into_inner()).unwrap();
}
