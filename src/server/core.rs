use log::{error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::config::ServerSettings;
use crate::protocol::responses::{SERVICE_UNAVAILABLE, format_response};
use crate::server::registry::ClientRegistry;
use crate::server::session::handle_client;
use crate::storage::StorageService;

pub struct Server {
    client_registry: Arc<Mutex<ClientRegistry>>,
    storage: Arc<dyn StorageService>,
    listener: TcpListener,
    settings: Arc<ServerSettings>,
}

impl Server {
    /// Binds the listener. The storage root must already be prepared.
    pub async fn bind(
        settings: ServerSettings,
        storage: Arc<dyn StorageService>,
    ) -> io::Result<Self> {
        let socket = settings.listen_socket();
        let listener = TcpListener::bind(&socket).await.map_err(|e| {
            error!("Failed to bind to {}: {}", socket, e);
            e
        })?;
        info!("Server bound to {}", listener.local_addr()?);

        Ok(Self {
            client_registry: Arc::new(Mutex::new(ClientRegistry::new(settings.max_clients))),
            storage,
            listener,
            settings: Arc::new(settings),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn start(&self) {
        info!(
            "Starting JSON feeder on {} (max {} clients)",
            self.settings.listen_socket(),
            self.settings.max_clients
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let client_registry = Arc::clone(&self.client_registry);
                    let storage = Arc::clone(&self.storage);
                    let settings = Arc::clone(&self.settings);

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_new_client(stream, addr, client_registry, storage, settings)
                                .await
                        {
                            warn!("Failed to handle client {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Registers the client, runs its session, and unregisters it afterwards.
async fn handle_new_client(
    mut stream: TcpStream,
    client_addr: SocketAddr,
    client_registry: Arc<Mutex<ClientRegistry>>,
    storage: Arc<dyn StorageService>,
    settings: Arc<ServerSettings>,
) -> io::Result<()> {
    {
        let mut clients = client_registry.lock().await;
        if !clients.try_insert(client_addr) {
            warn!(
                "Rejecting {}: {} clients already connected",
                client_addr,
                clients.max_clients()
            );
            drop(clients);
            stream
                .write_all(
                    format_response(SERVICE_UNAVAILABLE, "Too many connections. Try again later.")
                        .as_bytes(),
                )
                .await?;
            return Ok(());
        }
        info!(
            "Client connected: {} ({}/{} clients)",
            client_addr,
            clients.len(),
            clients.max_clients()
        );
    }

    let outcome = handle_client(stream, client_addr, storage, settings).await;

    let mut clients = client_registry.lock().await;
    if let Some(duration) = clients.remove(&client_addr) {
        info!(
            "Client {} disconnected after {:.1}s",
            client_addr,
            duration.as_secs_f64()
        );
    }

    outcome
}
