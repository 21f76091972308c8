use std::collections::HashMap;

use anyhow::{Context as _, Result};
use sysinfo::Pid;
use tracing::instrument;
use xcb::{
    x::{self, Atom, GetProperty, GrabServer, InternAtom, UngrabServer, Window, ATOM_ANY},
    Connection,
};

use super::{executable_name, ForegroundWindow, WindowObserver};

fn intern_atom(conn: &Connection, name: &[u8]) -> Result<Atom> {
    let reply = conn.wait_for_reply(conn.send_request(&InternAtom {
        only_if_exists: false,
        name,
    }))?;
    Ok(reply.atom())
}

fn get_pid(conn: &Connection, window: Window, pid_atom: Atom) -> Result<Option<u32>> {
    let result = conn.wait_for_reply(conn.send_request(&GetProperty {
        delete: false,
        window,
        property: pid_atom,
        r#type: ATOM_ANY,
        long_offset: 0,
        long_length: 1,
    }))?;
    let result_slice = result.value::<u32>();
    if result_slice.is_empty() {
        return Ok(None);
    }
    Ok(Some(result_slice[0]))
}

fn get_process_name(id: u32) -> Result<Option<String>> {
    let system = sysinfo::System::new_all();
    let Some(process) = system.process(Pid::from_u32(id)) else {
        return Ok(None);
    };

    Ok(process
        .exe()
        .and_then(|v| v.to_str())
        .map(|v| executable_name(v)))
}

fn get_active_window(conn: &Connection, root: &Window, active_window_atom: Atom) -> Result<Window> {
    let result = conn.wait_for_reply(conn.send_request(&GetProperty {
        delete: false,
        window: *root,
        property: active_window_atom,
        r#type: ATOM_ANY,
        long_offset: 0,
        long_length: 1,
    }))?;
    let windows = result.value::<Window>();
    windows
        .first()
        .copied()
        .context("No active window reported by the window manager")
}

fn get_name(conn: &Connection, window: Window, wm_name_atom: Atom) -> Result<String> {
    let wm_name = conn.wait_for_reply(conn.send_request(&x::GetProperty {
        delete: false,
        window,
        property: wm_name_atom,
        r#type: x::ATOM_ANY,
        long_offset: 0,
        long_length: 1024,
    }))?;
    let title = String::from_utf8_lossy(wm_name.value()).to_string();
    Ok(title)
}

/// Native probe for X11: EWMH properties for the foreground window and the
/// window-manager client list for the running-app set.
pub struct X11Observer {
    connection: Connection,
    preferred_screen: i32,
    active_window_atom: Atom,
    window_name_atom: Atom,
    pid_atom: Atom,
    client_list_atom: Atom,
}

impl X11Observer {
    pub fn new() -> Result<Self> {
        let (connection, preferred_screen) = xcb::Connection::connect(None)?;
        let active_window_atom = intern_atom(&connection, b"_NET_ACTIVE_WINDOW")?;
        let window_name_atom = intern_atom(&connection, b"_NET_WM_NAME")?;
        let pid_atom = intern_atom(&connection, b"_NET_WM_PID")?;
        let client_list_atom = intern_atom(&connection, b"_NET_CLIENT_LIST")?;
        Ok(Self {
            connection,
            preferred_screen,
            active_window_atom,
            window_name_atom,
            pid_atom,
            client_list_atom,
        })
    }

    fn root_window(&self) -> Window {
        let setup = self.connection.get_setup();
        // Only 1 x11 screen is supported.
        setup
            .roots()
            .nth(self.preferred_screen.max(0) as usize)
            .expect("Preferred screen should exist")
            .root()
    }

    #[instrument(skip(self))]
    fn get_foreground_inner(&self) -> Result<ForegroundWindow> {
        let root = self.root_window();
        let active_window = get_active_window(&self.connection, &root, self.active_window_atom)?;
        let window_title = get_name(&self.connection, active_window, self.window_name_atom)?;
        let pid = get_pid(&self.connection, active_window, self.pid_atom)?
            .context("Active window has no _NET_WM_PID")?;
        let app_name =
            get_process_name(pid)?.context("Active window's process has already exited")?;
        Ok(ForegroundWindow {
            app_name,
            window_title,
        })
    }

    #[instrument(skip(self))]
    fn get_running_inner(&self) -> Result<HashMap<String, String>> {
        let root = self.root_window();
        let reply = self.connection.wait_for_reply(self.connection.send_request(&GetProperty {
            delete: false,
            window: root,
            property: self.client_list_atom,
            r#type: ATOM_ANY,
            long_offset: 0,
            long_length: 1024,
        }))?;

        let mut apps = HashMap::new();
        for window in reply.value::<Window>() {
            let Some(pid) = get_pid(&self.connection, *window, self.pid_atom)? else {
                continue;
            };
            let Some(app_name) = get_process_name(pid)? else {
                continue;
            };
            let title = get_name(&self.connection, *window, self.window_name_atom)
                .unwrap_or_default();
            apps.insert(app_name, title);
        }
        Ok(apps)
    }
}

impl WindowObserver for X11Observer {
    #[instrument(skip(self))]
    fn foreground(&mut self) -> Result<ForegroundWindow> {
        let _ = self.connection.send_request(&GrabServer {});
        let result = self.get_foreground_inner();
        let _ = self.connection.send_request(&UngrabServer {});
        result
    }

    #[instrument(skip(self))]
    fn running_apps(&mut self) -> Result<HashMap<String, String>> {
        self.get_running_inner()
    }
}
