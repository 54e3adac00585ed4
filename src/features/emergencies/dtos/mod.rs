mod emergency_dto;

pub use emergency_dto::{
    CreateEmergencyDto, DispatchResponseDto, EmergencyDetailResponseDto, EmergencyResponseDto,
};
