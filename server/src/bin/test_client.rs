//! Headless bot: joins, strafes in a circle, fires and reloads, and logs
//! what the server sends back.

use clap::Parser;
use env_logger::Env;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use skirmish_shared::{
    decode_server_event, encode_client_event, ClientEvent, ProjectileKind, ServerEvent, Vec3,
};
use std::time::Duration;
use tokio::time::interval;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    server: String,

    /// Display name to join with
    #[arg(short, long, default_value = "bot")]
    username: String,

    /// Stop after this many seconds (0 runs until the server closes)
    #[arg(short, long, default_value = "10")]
    duration: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let url = format!("ws://{}", args.server);
    info!("Connecting to {}", url);
    let (ws_stream, _) = connect_async(url.as_str()).await?;
    let (mut write, mut read) = ws_stream.split();

    let join = ClientEvent::Join {
        username: Some(args.username.clone()),
        color: None,
    };
    write.send(Message::Text(encode_client_event(&join)?)).await?;

    let mut act = interval(Duration::from_millis(100));
    let run_for = match args.duration {
        0 => Duration::from_secs(365 * 24 * 60 * 60),
        secs => Duration::from_secs(secs),
    };
    let deadline = tokio::time::sleep(run_for);
    tokio::pin!(deadline);

    let mut step: u32 = 0;
    let mut my_id = None;
    let mut snapshots: u64 = 0;

    loop {
        tokio::select! {
            _ = &mut deadline => {
                info!("Done after {} snapshots", snapshots);
                break;
            }

            _ = act.tick() => {
                step += 1;
                let angle = step as f32 * 0.1;
                let position = Vec3::new(angle.cos() * 5.0, 1.0, angle.sin() * 5.0);
                let mut intents = vec![ClientEvent::PlayerInput {
                    position,
                    rotation: Vec3::new(0.0, angle, 0.0),
                }];
                if step % 5 == 0 {
                    intents.push(ClientEvent::Shoot {
                        position,
                        direction: Vec3::new(-position.x, 0.2, -position.z),
                        kind: ProjectileKind::Normal,
                    });
                }
                if step % 60 == 0 {
                    intents.push(ClientEvent::ReloadWeapon {});
                }
                for intent in intents {
                    write.send(Message::Text(encode_client_event(&intent)?)).await?;
                }
            }

            incoming = read.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Server closed the connection");
                        break;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!("Connection error: {}", e);
                        break;
                    }
                };
                match decode_server_event(&text) {
                    Ok(ServerEvent::Welcome { id }) => {
                        info!("Connected as session {}", id);
                        my_id = Some(id);
                    }
                    Ok(ServerEvent::StatePlayers(_)) => snapshots += 1,
                    Ok(ServerEvent::StateBullets(_)) | Ok(ServerEvent::StateMinions(_)) => {}
                    Ok(ServerEvent::PlayerDied { id, .. }) if Some(id) == my_id => {
                        info!("Died, requesting respawn");
                        let respawn = encode_client_event(&ClientEvent::RequestRespawn {})?;
                        write.send(Message::Text(respawn)).await?;
                    }
                    Ok(event) => debug!("{:?}", event),
                    Err(e) => warn!("Undecodable frame: {}", e),
                }
            }
        }
    }

    let _ = write.send(Message::Close(None)).await;
    Ok(())
}
